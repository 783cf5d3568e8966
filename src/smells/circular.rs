use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

static REQUIRE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*require(_relative)?\s*\(?\s*['"]([^'"]+)['"]"#).unwrap()
});

/// Where a module requires another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireSite {
    pub file: PathBuf,
    pub line: usize,
}

/// Two modules that require each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackReference {
    pub first: String,
    pub second: String,
    pub site: RequireSite,
}

/// Require graph keyed by module path: the file's path below the deepest
/// directory shared by every analysed file, without its extension.
#[derive(Debug, Clone, Default)]
pub struct RequireGraph {
    adjacency: BTreeMap<String, BTreeMap<String, RequireSite>>,
}

impl RequireGraph {
    pub fn build(files: &BTreeMap<PathBuf, String>) -> Self {
        let root = common_root(files.keys());
        let modules: BTreeSet<String> = files.keys().map(|p| module_key(&root, p)).collect();

        let mut graph = Self::default();
        for (path, source) in files {
            let module = module_key(&root, path);
            graph.adjacency.entry(module.clone()).or_default();
            for (idx, line) in source.lines().enumerate() {
                let Some(caps) = REQUIRE.captures(line) else {
                    continue;
                };
                let target = if caps.get(1).is_some() {
                    let base = path.parent().unwrap_or(Path::new(""));
                    module_key(&root, &base.join(&caps[2]))
                } else {
                    load_path_target(&modules, &caps[2])
                };
                if target != module {
                    graph.add_dependency(&module, target, path, idx + 1);
                }
            }
        }
        graph
    }

    fn add_dependency(&mut self, from: &str, to: String, file: &Path, line: usize) {
        self.adjacency
            .entry(from.to_string())
            .or_default()
            .entry(to)
            .or_insert_with(|| RequireSite {
                file: file.to_path_buf(),
                line,
            });
    }

    pub fn module_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn dependencies(&self, module: &str) -> Vec<String> {
        self.adjacency
            .get(module)
            .map(|deps| deps.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Pairs `A -> B -> A`, each reported once with the site of the first
    /// module's require.
    pub fn back_references(&self) -> Vec<BackReference> {
        let mut seen: BTreeSet<(String, String)> = BTreeSet::new();
        let mut found = Vec::new();

        for (module, deps) in &self.adjacency {
            for (dep, site) in deps {
                let pair = if module < dep {
                    (module.clone(), dep.clone())
                } else {
                    (dep.clone(), module.clone())
                };
                let mutual = self
                    .adjacency
                    .get(dep)
                    .is_some_and(|back| back.contains_key(module));
                if mutual && seen.insert(pair) {
                    found.push(BackReference {
                        first: module.clone(),
                        second: dep.clone(),
                        site: site.clone(),
                    });
                }
            }
        }
        found
    }
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Deepest directory containing every file.
fn common_root<'a>(paths: impl Iterator<Item = &'a PathBuf>) -> PathBuf {
    let mut root: Option<PathBuf> = None;
    for path in paths {
        let dir = normalize(path.parent().unwrap_or(Path::new("")));
        root = Some(match root {
            None => dir,
            Some(current) => current
                .components()
                .zip(dir.components())
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| a.as_os_str())
                .collect(),
        });
    }
    root.unwrap_or_default()
}

fn module_key(root: &Path, path: &Path) -> String {
    let path = normalize(path).with_extension("");
    let relative = path.strip_prefix(root).unwrap_or(&path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// A plain `require` names a path on the load path, so it matches the
/// module whose key ends with it. Unknown names are external libraries.
fn load_path_target(modules: &BTreeSet<String>, name: &str) -> String {
    let name = name.strip_suffix(".rb").unwrap_or(name);
    let suffix = format!("/{name}");
    modules
        .iter()
        .find(|m| m.as_str() == name || m.ends_with(&suffix))
        .cloned()
        .unwrap_or_else(|| name.to_string())
}
