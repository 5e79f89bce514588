//! Per-call configuration namespaces.
//!
//! Every `required_clocks` call opens a fresh [`Namespace`] that maps
//! symbolic keys (`"vco"`, `"m_vco"`, ...) to the expressions registered for
//! them. Backend variable names are prefixed with the namespace scope so two
//! devices sharing one backend never collide, and opening a scope again
//! replaces whatever the previous call registered under it.

use crate::error::ModelError;
use jif_common::{rational_to_json, Rational};
use jif_solver::{Backend, Domain, Expr};
use std::collections::BTreeMap;

/// Symbolic names of one device's variables and derived quantities.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Namespace {
    scope: String,
    entries: BTreeMap<String, Expr>,
}

impl Namespace {
    /// Creates an empty namespace.
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Creates an empty namespace and opens its scope on `model`.
    ///
    /// Registrations left in `model` by an earlier namespace with the same
    /// scope are dropped.
    pub fn open(model: &mut dyn Backend, scope: impl Into<String>) -> Result<Self, ModelError> {
        let ns = Self::new(scope);
        model.open_scope(&ns.scope)?;
        Ok(ns)
    }

    /// Returns the scope prefix.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    fn qualified(&self, key: &str) -> String {
        format!("{}.{key}", self.scope)
    }

    /// Declares a decision variable under `key`.
    pub fn variable(
        &mut self,
        model: &mut dyn Backend,
        key: &str,
        domain: &Domain,
    ) -> Result<Expr, ModelError> {
        let expr = model.make_variable(&self.qualified(key), domain)?;
        self.entries.insert(key.to_string(), expr.clone());
        Ok(expr)
    }

    /// Registers a derived quantity under `key`.
    pub fn derived(
        &mut self,
        model: &mut dyn Backend,
        key: &str,
        expr: Expr,
    ) -> Result<Expr, ModelError> {
        let expr = model.make_derived(&self.qualified(key), expr)?;
        self.entries.insert(key.to_string(), expr.clone());
        Ok(expr)
    }

    /// Records a fixed value under `key`.
    pub fn constant(&mut self, key: &str, value: Rational) -> Expr {
        let expr = Expr::constant(value);
        self.entries.insert(key.to_string(), expr.clone());
        expr
    }

    /// Looks up the expression stored under `key`.
    pub fn get(&self, key: &str) -> Result<&Expr, ModelError> {
        self.entries.get(key).ok_or_else(|| ModelError::MissingEntry {
            scope: self.scope.clone(),
            key: key.to_string(),
        })
    }

    /// Returns `true` if `key` is defined.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterates over the defined keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the number of defined keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been defined.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reads the solved value of `key`.
    pub fn value(&self, model: &dyn Backend, key: &str) -> Result<Rational, ModelError> {
        Ok(model.value(self.get(key)?)?)
    }

    /// Reads the solved value of `key` as a JSON number.
    pub fn json(&self, model: &dyn Backend, key: &str) -> Result<serde_json::Value, ModelError> {
        Ok(rational_to_json(&self.value(model, key)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jif_common::hz;
    use jif_solver::{new_backend, Constraint, SolveOptions, SolverKind};

    #[test]
    fn variables_are_scoped() {
        let mut model = new_backend(SolverKind::Intermediate);
        let mut ns = Namespace::new("ad9528");
        ns.variable(model.as_mut(), "r1", &Domain::integer_range(1, 31))
            .unwrap();
        assert_eq!(model.variables()[0].name, "ad9528.r1");
        assert!(ns.contains("r1"));
        assert_eq!(ns.len(), 1);
    }

    #[test]
    fn reopening_drops_the_previous_call() {
        let mut model = new_backend(SolverKind::Intermediate);
        for _ in 0..2 {
            let mut ns = Namespace::open(model.as_mut(), "ad9528").unwrap();
            let r1 = ns
                .variable(model.as_mut(), "r1", &Domain::integer_range(1, 31))
                .unwrap();
            model.add_constraint(Constraint::equal(&r1, hz(2))).unwrap();
        }
        assert_eq!(model.variable_count(), 1);
        assert_eq!(model.constraint_count(), 1);
    }

    #[test]
    fn missing_entry_names_scope_and_key() {
        let ns = Namespace::new("fpga");
        let err = ns.get("vco").unwrap_err();
        assert_eq!(
            err,
            ModelError::MissingEntry {
                scope: "fpga".to_string(),
                key: "vco".to_string(),
            }
        );
    }

    #[test]
    fn values_read_back_after_solve() {
        for kind in SolverKind::ALL {
            let mut model = new_backend(kind);
            let mut ns = Namespace::new("dev");
            let d = ns
                .variable(model.as_mut(), "d", &Domain::integers([1, 2, 4]))
                .unwrap();
            let input = ns.constant("input", hz(1_000));
            let out = ns.derived(model.as_mut(), "out", &input / &d).unwrap();
            model
                .add_constraint(Constraint::equal(&out, hz(250)))
                .unwrap();
            model.solve(&SolveOptions::default()).unwrap();
            assert_eq!(ns.value(model.as_ref(), "d").unwrap(), hz(4));
            assert_eq!(ns.json(model.as_ref(), "out").unwrap(), serde_json::json!(250));
            assert_eq!(ns.keys().collect::<Vec<_>>(), vec!["d", "input", "out"]);
        }
    }
}
