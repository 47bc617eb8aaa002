//! Region filters: the visibility policy attached to a digraph edge.
//!
//! A [`RegionFilter`] maps a namespace (module identity, service, or any
//! capability namespace) to the compiled expressions that admit candidates
//! of that namespace across the edge. Filters are fail-closed: a namespace
//! that the filter does not mention admits nothing.
//!
//! - **Expressions** ([`expr`]): LDAP-style AST evaluated against [`Attributes`]
//! - **Parser** ([`parser`]): compiles expression text once, at build time

pub mod expr;
pub mod parser;

use std::collections::BTreeMap;
use std::fmt;

use crate::attributes::Attributes;
use crate::error::FilterError;
use crate::version::VersionRange;

pub use expr::{CompareOp, FilterExpr};

/// Well-known namespaces.
pub mod namespace {
    /// Module identity: `name`, `version` and `id` attributes.
    pub const MODULE: &str = "module";
    /// Published services: service properties plus `service.id` and `service.owner`.
    pub const SERVICE: &str = "service";
    /// Expressions in this namespace apply to candidates of every namespace.
    pub const ALL: &str = "all";
}

/// Attribute keys the typed front-ends expose to filters.
pub mod keys {
    pub const NAME: &str = "name";
    pub const VERSION: &str = "version";
    pub const ID: &str = "id";
    pub const OBJECT_CLASS: &str = "objectClass";
    pub const SERVICE_ID: &str = "service.id";
    pub const SERVICE_OWNER: &str = "service.owner";
}

/// Per-edge visibility policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionFilter {
    policies: BTreeMap<String, Vec<FilterExpr>>,
}

impl RegionFilter {
    /// Start building a filter.
    pub fn builder() -> RegionFilterBuilder {
        RegionFilterBuilder::default()
    }

    /// A filter that admits nothing.
    pub fn deny_all() -> Self {
        Self::default()
    }

    /// A filter that admits every candidate of every namespace.
    pub fn allow_everything() -> Self {
        Self::builder().allow_everything().build()
    }

    /// Compile a filter from its textual sharing policy (namespace → expressions).
    pub fn from_policy<I, S>(policy: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = (S, Vec<String>)>,
        S: Into<String>,
    {
        let mut builder = Self::builder();
        for (namespace, expressions) in policy {
            let namespace = namespace.into();
            builder = builder.declare(&namespace);
            for text in &expressions {
                builder = builder.allow(&namespace, text)?;
            }
        }
        Ok(builder.build())
    }

    /// Whether a candidate of `namespace` described by `attrs` may cross.
    pub fn allows(&self, namespace: &str, attrs: &Attributes) -> bool {
        self.allows_in(namespace, attrs)
            || (namespace != namespace::ALL && self.allows_in(namespace::ALL, attrs))
    }

    fn allows_in(&self, namespace: &str, attrs: &Attributes) -> bool {
        self.policies
            .get(namespace)
            .is_some_and(|exprs| exprs.iter().any(|e| e.matches(attrs)))
    }

    /// Namespaces the filter mentions, in lexical order.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }

    /// Expressions registered for a namespace (empty if absent).
    pub fn expressions(&self, namespace: &str) -> &[FilterExpr] {
        self.policies
            .get(namespace)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether the filter mentions no namespace at all.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Textual form of the filter, suitable for [`RegionFilter::from_policy`].
    pub fn sharing_policy(&self) -> BTreeMap<String, Vec<String>> {
        self.policies
            .iter()
            .map(|(ns, exprs)| (ns.clone(), exprs.iter().map(ToString::to_string).collect()))
            .collect()
    }
}

impl fmt::Display for RegionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.policies.is_empty() {
            return write!(f, "<deny all>");
        }
        for (i, (ns, exprs)) in self.policies.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{ns}: ")?;
            if exprs.is_empty() {
                write!(f, "<none>")?;
            }
            for (j, e) in exprs.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{e}")?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for [`RegionFilter`]. Expression text is compiled as it is added.
#[derive(Debug, Default)]
pub struct RegionFilterBuilder {
    policies: BTreeMap<String, Vec<FilterExpr>>,
}

impl RegionFilterBuilder {
    /// Mention a namespace without admitting anything in it.
    pub fn declare(mut self, namespace: &str) -> Self {
        self.policies.entry(namespace.to_string()).or_default();
        self
    }

    /// Admit candidates of `namespace` matching the expression text.
    pub fn allow(self, namespace: &str, expression: &str) -> Result<Self, FilterError> {
        let expr = FilterExpr::parse(expression)?;
        Ok(self.allow_expr(namespace, expr))
    }

    /// Admit candidates of `namespace` matching an already compiled expression.
    pub fn allow_expr(mut self, namespace: &str, expr: FilterExpr) -> Self {
        let exprs = self.policies.entry(namespace.to_string()).or_default();
        if !exprs.contains(&expr) {
            exprs.push(expr);
        }
        self
    }

    /// Admit every candidate of `namespace`.
    pub fn allow_all(self, namespace: &str) -> Self {
        self.allow_expr(namespace, FilterExpr::MatchAll)
    }

    /// Admit every candidate of every namespace.
    pub fn allow_everything(self) -> Self {
        self.allow_all(namespace::ALL)
    }

    /// Admit the module with symbolic `name` whose version lies in `range`.
    pub fn allow_module(self, name: &str, range: &VersionRange) -> Self {
        let mut terms = vec![FilterExpr::equals(keys::NAME, name)];

        let floor = range.floor().to_string();
        terms.push(if range.floor_inclusive() {
            version_cmp(CompareOp::GreaterEq, floor)
        } else {
            FilterExpr::Not(Box::new(version_cmp(CompareOp::LessEq, floor)))
        });

        if let Some(ceiling) = range.ceiling() {
            let ceiling = ceiling.to_string();
            terms.push(if range.ceiling_inclusive() {
                version_cmp(CompareOp::LessEq, ceiling)
            } else {
                FilterExpr::Not(Box::new(version_cmp(CompareOp::GreaterEq, ceiling)))
            });
        }

        self.allow_expr(namespace::MODULE, FilterExpr::And(terms))
    }

    /// Admit services registered under `object_class`.
    pub fn allow_service(self, object_class: &str) -> Self {
        self.allow_expr(
            namespace::SERVICE,
            FilterExpr::equals(keys::OBJECT_CLASS, object_class),
        )
    }

    pub fn build(self) -> RegionFilter {
        RegionFilter {
            policies: self.policies,
        }
    }
}

fn version_cmp(op: CompareOp, value: String) -> FilterExpr {
    FilterExpr::Compare {
        attr: keys::VERSION.to_string(),
        op,
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;

    fn module(name: &str, version: &str) -> Attributes {
        Attributes::new()
            .with(keys::NAME, name)
            .with(keys::VERSION, Version::parse(version).unwrap())
    }

    #[test]
    fn absent_namespace_denies() {
        let filter = RegionFilter::builder()
            .allow("export", "(name=X)")
            .unwrap()
            .build();
        let attrs = Attributes::new().with("name", "X");
        assert!(filter.allows("export", &attrs));
        assert!(!filter.allows("import", &attrs));
        assert!(!RegionFilter::deny_all().allows("export", &attrs));
    }

    #[test]
    fn declared_but_empty_namespace_denies() {
        let filter = RegionFilter::builder().declare("export").build();
        assert!(!filter.allows("export", &Attributes::new()));
        assert_eq!(filter.namespaces().collect::<Vec<_>>(), vec!["export"]);
    }

    #[test]
    fn any_expression_in_namespace_admits() {
        let filter = RegionFilter::builder()
            .allow("export", "(name=X)")
            .unwrap()
            .allow("export", "(name=Y)")
            .unwrap()
            .build();
        assert!(filter.allows("export", &Attributes::new().with("name", "Y")));
        assert!(!filter.allows("export", &Attributes::new().with("name", "Z")));
    }

    #[test]
    fn all_namespace_applies_everywhere() {
        let filter = RegionFilter::allow_everything();
        assert!(filter.allows(namespace::MODULE, &Attributes::new()));
        assert!(filter.allows("anything", &Attributes::new()));

        let narrow = RegionFilter::builder()
            .allow(namespace::ALL, "(vendor=acme)")
            .unwrap()
            .build();
        assert!(narrow.allows("export", &Attributes::new().with("vendor", "acme")));
        assert!(!narrow.allows("export", &Attributes::new().with("vendor", "other")));
    }

    #[test]
    fn module_sugar_honours_version_range() {
        let range = VersionRange::parse("[1.0,2.0)").unwrap();
        let filter = RegionFilter::builder()
            .allow_module("org.example.core", &range)
            .build();

        assert!(filter.allows(namespace::MODULE, &module("org.example.core", "1.0")));
        assert!(filter.allows(namespace::MODULE, &module("org.example.core", "1.9.9")));
        assert!(!filter.allows(namespace::MODULE, &module("org.example.core", "2.0")));
        assert!(!filter.allows(namespace::MODULE, &module("org.example.api", "1.5")));

        let exclusive = VersionRange::parse("(1.0,2.0]").unwrap();
        let filter = RegionFilter::builder()
            .allow_module("org.example.core", &exclusive)
            .build();
        assert!(!filter.allows(namespace::MODULE, &module("org.example.core", "1.0")));
        assert!(filter.allows(namespace::MODULE, &module("org.example.core", "2.0")));
    }

    #[test]
    fn service_sugar() {
        let filter = RegionFilter::builder().allow_service("org.example.Log").build();
        let attrs = Attributes::new().with(keys::OBJECT_CLASS, vec!["org.example.Log"]);
        assert!(filter.allows(namespace::SERVICE, &attrs));
        assert!(!filter.allows(namespace::MODULE, &attrs));
    }

    #[test]
    fn malformed_expression_fails_at_build_time() {
        let err = RegionFilter::builder().allow("export", "(name=X").unwrap_err();
        assert!(matches!(err, FilterError::Parse { .. }));
    }

    #[test]
    fn sharing_policy_round_trips() {
        let filter = RegionFilter::builder()
            .allow_module("core", &VersionRange::parse("[1,2)").unwrap())
            .allow_service("org.example.Log")
            .declare("export")
            .build();
        let rebuilt = RegionFilter::from_policy(filter.sharing_policy()).unwrap();
        assert_eq!(rebuilt, filter);
    }

    #[test]
    fn display() {
        assert_eq!(RegionFilter::deny_all().to_string(), "<deny all>");
        let filter = RegionFilter::builder()
            .allow_service("a.B")
            .declare("export")
            .build();
        assert_eq!(filter.to_string(), "export: <none>; service: (objectClass=a.B)");
    }
}
