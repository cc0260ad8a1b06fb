//! Dispatch: classify a field's type, look its tag up in the registry and run
//! the builder, recursing through `BuildContext::build_child` for containers.
//!
//! Dispatch never leaves half a tree behind. A builder either returns a
//! complete binding or an error, and container builders dispose of whatever
//! children they already built before propagating a child's failure. The
//! error travels all the way up: there is no partial form.

use tracing::debug;

use crate::binding::Binding;
use crate::classify::{classify, TypeDescriptor};
use crate::error::{FormError, Result};
use crate::registry::{BuilderFn, HandlerRegistry};
use crate::schema::{FieldSchema, TypeExpr, TypeNamespace};
use crate::settings::FormSettings;
use crate::toolkit::Toolkit;

/// Classifier + registry + the namespace named types resolve against.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    registry: HandlerRegistry,
    namespace: TypeNamespace,
    settings: FormSettings,
}

impl Dispatcher {
    pub fn new(namespace: TypeNamespace) -> Self {
        Self {
            namespace,
            ..Self::default()
        }
    }

    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_settings(mut self, settings: FormSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }

    pub fn namespace(&self) -> &TypeNamespace {
        &self.namespace
    }

    pub fn settings(&self) -> &FormSettings {
        &self.settings
    }

    /// Resolve `ty` to the builder that handles it, plus the classified type
    /// the builder expects.
    pub fn dispatch(&self, ty: &TypeExpr) -> Result<(BuilderFn, TypeDescriptor)> {
        self.dispatch_at(ty, &ty.to_string())
    }

    fn dispatch_at(&self, ty: &TypeExpr, path: &str) -> Result<(BuilderFn, TypeDescriptor)> {
        let unsupported = || FormError::UnsupportedType {
            ty: ty.to_string(),
            path: path.to_string(),
        };
        let descriptor = classify(ty, &self.namespace).ok_or_else(unsupported)?;
        let builder = self.registry.get(descriptor.tag()).ok_or_else(unsupported)?;
        Ok((builder, descriptor))
    }

    /// Build the editor tree for one field.
    pub fn build(&self, toolkit: &mut dyn Toolkit, field: &FieldSchema) -> Result<Binding> {
        let mut ctx = BuildContext {
            dispatcher: self,
            toolkit,
            depth: 0,
            lineage: Vec::new(),
            path: Vec::new(),
        };
        ctx.build_child(&field.name, field)
    }

    /// Build the editor tree for the named root record.
    pub fn build_root(&self, toolkit: &mut dyn Toolkit, root: &str) -> Result<Binding> {
        self.build(toolkit, &FieldSchema::new(root, TypeExpr::named(root)))
    }
}

/// State threaded through one build: the toolkit, the current path and the
/// recursion guards.
pub struct BuildContext<'a> {
    dispatcher: &'a Dispatcher,
    toolkit: &'a mut dyn Toolkit,
    depth: usize,
    lineage: Vec<String>,
    path: Vec<String>,
}

impl<'a> BuildContext<'a> {
    pub fn toolkit(&mut self) -> &mut dyn Toolkit {
        &mut *self.toolkit
    }

    pub fn settings(&self) -> &FormSettings {
        &self.dispatcher.settings
    }

    pub fn namespace(&self) -> &TypeNamespace {
        &self.dispatcher.namespace
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Dotted location of the node being built, for diagnostics.
    pub fn path(&self) -> String {
        if self.path.is_empty() {
            "<root>".to_string()
        } else {
            self.path.join(".")
        }
    }

    /// Classify without building; used to route union defaults.
    pub fn classify(&self, ty: &TypeExpr) -> Option<TypeDescriptor> {
        classify(ty, &self.dispatcher.namespace)
    }

    /// Dispatch `field` one level below the current node.
    pub fn build_child(&mut self, segment: &str, field: &FieldSchema) -> Result<Binding> {
        self.path.push(segment.to_string());
        self.depth += 1;
        let result = self.build_here(field);
        self.depth -= 1;
        self.path.pop();
        result
    }

    fn build_here(&mut self, field: &FieldSchema) -> Result<Binding> {
        let limit = self.settings().max_depth;
        if self.depth > limit {
            return Err(FormError::RecursionLimit {
                limit,
                path: self.path(),
            });
        }
        let (builder, descriptor) = self.dispatcher.dispatch_at(&field.ty, &self.path())?;
        debug!(path = %self.path(), tag = %descriptor.tag(), "dispatch");
        builder(self, field, descriptor)
    }

    /// Mark a record as under construction. Fails if it already is, i.e. the
    /// record (transitively) contains itself.
    pub fn enter_record(&mut self, name: &str) -> Result<()> {
        if self.lineage.iter().any(|n| n == name) {
            return Err(FormError::RecursiveRecord {
                name: name.to_string(),
                path: self.path(),
            });
        }
        self.lineage.push(name.to_string());
        Ok(())
    }

    pub fn leave_record(&mut self) {
        self.lineage.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::TypeTag;
    use crate::memory::MemoryToolkit;
    use crate::schema::{PrimitiveKind, RecordType};

    #[test]
    fn dispatch_reports_the_offending_type() {
        let dispatcher = Dispatcher::default();
        let err = dispatcher.dispatch(&TypeExpr::named("list")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "handler for type `list` at `list` is not implemented"
        );
    }

    #[test]
    fn missing_registry_entry_is_unsupported() {
        let mut registry = HandlerRegistry::standard();
        registry.unregister(TypeTag::Bool);
        let dispatcher = Dispatcher::default().with_registry(registry);
        let mut tk = MemoryToolkit::new();
        let field = FieldSchema::new("flag", TypeExpr::primitive(PrimitiveKind::Bool));
        let err = dispatcher.build(&mut tk, &field).unwrap_err();
        assert!(matches!(err, FormError::UnsupportedType { ref path, .. } if path == "flag"));
        assert_eq!(tk.live_nodes(), 0);
    }

    #[test]
    fn depth_limit_applies_to_non_record_nesting() {
        let mut ty = TypeExpr::primitive(PrimitiveKind::Int);
        for _ in 0..5 {
            ty = TypeExpr::list(ty);
        }
        let dispatcher =
            Dispatcher::default().with_settings(FormSettings::default().with_max_depth(3));
        let mut tk = MemoryToolkit::new();
        let err = dispatcher
            .build(&mut tk, &FieldSchema::new("deep", ty))
            .unwrap_err();
        assert!(matches!(err, FormError::RecursionLimit { limit: 3, .. }));
        assert_eq!(tk.live_nodes(), 0);
    }

    #[test]
    fn self_referential_record_is_rejected() {
        let mut ns = TypeNamespace::new();
        ns.define_record(RecordType::new(
            "Node",
            vec![
                FieldSchema::new("label", TypeExpr::primitive(PrimitiveKind::Str)),
                FieldSchema::new("next", TypeExpr::named("Node")),
            ],
        ));
        let dispatcher = Dispatcher::new(ns);
        let mut tk = MemoryToolkit::new();
        let err = dispatcher.build_root(&mut tk, "Node").unwrap_err();
        match err {
            FormError::RecursiveRecord { name, path } => {
                assert_eq!(name, "Node");
                assert_eq!(path, "Node.next");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(tk.live_nodes(), 0);
    }
}
