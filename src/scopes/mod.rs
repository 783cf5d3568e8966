//! Cross-cutting scopes: per line, per unit (method/class) and per project.
//!
//! Scopes are independent of the layers and may report the same underlying
//! issue from their own angle.

mod framework;
mod line;
mod unit;

pub use framework::FrameworkScope;
pub use line::LineScope;
pub use unit::UnitScope;

use crate::config::Thresholds;
use crate::core::Finding;
use std::path::Path;

/// Line then unit findings for one file. The framework scope needs every
/// file at once and runs separately.
pub fn check_file(source: &str, thresholds: &Thresholds, file: &Path) -> Vec<Finding> {
    let mut findings = LineScope.check(source, thresholds, file);
    findings.extend(UnitScope.check(source, thresholds, file));
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Category;

    #[test]
    fn line_findings_precede_unit_findings() {
        let source = "def process # TODO\nend\n";
        let findings = check_file(source, &Thresholds::default(), Path::new("a.rb"));
        let categories: Vec<Category> = findings.iter().map(|f| f.category).collect();
        assert_eq!(categories, vec![Category::Line, Category::Unit]);
    }
}
