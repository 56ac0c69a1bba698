// Type registry: checked construction of classes
//
// Defining a class computes its aggregated keyword vocabulary (its own
// `__init__` plus every registered ancestor) and stores it. Construction
// goes through `construct`, which runs the constructor first and classifies
// the keyword names afterwards.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use misprint_core::{Diagnostic, KeywordVocabulary, Prefixed};
use tracing::debug;

use super::{Kwargs, SharedSink, default_sink};
use crate::classifier::{CheckOptions, check_misprints};
use crate::extractor::extract;
use crate::syntax::{ClassDef, Module};

/// Error type for registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown type: {0}")]
    UnknownType(String),
    #[error("type {0} is already defined")]
    DuplicateType(String),
}

/// A class as seen by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredType {
    pub name: String,
    pub qualname: String,
    pub bases: Vec<String>,
    /// Union of the `__init__` vocabularies of the class and its ancestors.
    pub kwarg_names: KeywordVocabulary,
}

/// Registered classes and the sink their construction diagnostics go to.
pub struct TypeRegistry {
    types: HashMap<String, Arc<RegisteredType>>,
    /// Short name -> qualname of the latest class defined under it.
    by_name: HashMap<String, String>,
    sink: SharedSink,
    options: CheckOptions,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
            by_name: HashMap::new(),
            sink: default_sink(),
            options: CheckOptions::default(),
        }
    }

    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_options(mut self, options: CheckOptions) -> Self {
        self.options = options;
        self
    }

    /// Register a class. Its bases must be registered first to contribute;
    /// unknown bases such as `object` contribute nothing.
    pub fn define(&mut self, class: &ClassDef) -> Result<Arc<RegisteredType>, RegistryError> {
        if self.types.contains_key(&class.qualname) {
            return Err(RegistryError::DuplicateType(class.qualname.clone()));
        }
        Ok(self.redefine(class))
    }

    /// Register a class, replacing any earlier class with the same qualified
    /// name, as rebinding a class statement does.
    pub fn redefine(&mut self, class: &ClassDef) -> Arc<RegisteredType> {
        let own = class.constructor().map(|init| extract(init)).unwrap_or_default();
        self.insert(&class.name, &class.qualname, &class.bases, own)
    }

    /// Register a class known only by name, bases and the vocabulary of its
    /// own `__init__`, replacing any earlier class with the same name.
    pub fn redefine_parts(
        &mut self,
        name: &str,
        bases: &[String],
        own: KeywordVocabulary,
    ) -> Arc<RegisteredType> {
        self.insert(name, name, bases, own)
    }

    fn insert(
        &mut self,
        name: &str,
        qualname: &str,
        bases: &[String],
        mut kwarg_names: KeywordVocabulary,
    ) -> Arc<RegisteredType> {
        for base in bases {
            match self.resolve(base) {
                Some(ancestor) => kwarg_names.union_with(&ancestor.kwarg_names),
                None => debug!(class = %qualname, base = %base, "base not registered"),
            }
        }
        debug!(class = %qualname, %kwarg_names, "registered type");

        let registered = Arc::new(RegisteredType {
            name: name.to_string(),
            qualname: qualname.to_string(),
            bases: bases.to_vec(),
            kwarg_names,
        });
        self.by_name.insert(name.to_string(), qualname.to_string());
        self.types
            .insert(qualname.to_string(), Arc::clone(&registered));
        registered
    }

    /// Register every class of a module in definition order.
    pub fn register_module(&mut self, module: &Module) {
        for class in module.all_classes() {
            self.redefine(class);
        }
    }

    /// Look a type up by qualified name, then by short name.
    pub fn get(&self, name: &str) -> Option<Arc<RegisteredType>> {
        self.types.get(name).cloned().or_else(|| {
            self.by_name
                .get(name)
                .and_then(|qualname| self.types.get(qualname))
                .cloned()
        })
    }

    /// The stored aggregate vocabulary (`KWARG_NAMES`) of a type.
    pub fn kwarg_names(&self, name: &str) -> Option<KeywordVocabulary> {
        self.get(name).map(|t| t.kwarg_names.clone())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Construct an instance through `constructor`, then classify the
    /// keyword names it received. Messages are prefixed `Creating <name>: `
    /// with the type's name; see [`construct_displayed`] to name the
    /// instance instead.
    ///
    /// [`construct_displayed`]: Self::construct_displayed
    pub fn construct<A, V, T, C>(
        &self,
        name: &str,
        args: A,
        kwargs: Kwargs<V>,
        constructor: C,
    ) -> Result<T, RegistryError>
    where
        C: FnOnce(A, Kwargs<V>) -> T,
    {
        let registered = self
            .get(name)
            .ok_or_else(|| RegistryError::UnknownType(name.to_string()))?;
        let supplied: Vec<String> = kwargs.keys().cloned().collect();
        let instance = constructor(args, kwargs);
        self.check(&registered, supplied);
        Ok(instance)
    }

    /// Like [`construct`](Self::construct), but messages are prefixed with
    /// the new instance's display form, `Creating <instance>: `.
    pub fn construct_displayed<A, V, T, C>(
        &self,
        name: &str,
        args: A,
        kwargs: Kwargs<V>,
        constructor: C,
    ) -> Result<T, RegistryError>
    where
        T: fmt::Display,
        C: FnOnce(A, Kwargs<V>) -> T,
    {
        let registered = self
            .get(name)
            .ok_or_else(|| RegistryError::UnknownType(name.to_string()))?;
        let supplied: Vec<String> = kwargs.keys().cloned().collect();
        let instance = constructor(args, kwargs);
        self.check_as(&registered, &instance.to_string(), supplied);
        Ok(instance)
    }

    /// Classify construction keyword names for a registered type.
    pub fn check<I, S>(&self, registered: &RegisteredType, supplied: I) -> Vec<Diagnostic>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.check_as(registered, &registered.name, supplied)
    }

    fn check_as<I, S>(&self, registered: &RegisteredType, label: &str, supplied: I) -> Vec<Diagnostic>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if registered.kwarg_names.is_empty() && self.options.skip_empty_vocabulary {
            return Vec::new();
        }
        let sink = Prefixed::creating(label, &*self.sink);
        check_misprints(&registered.kwarg_names, supplied, &self.options, &sink)
    }

    fn resolve(&self, base: &str) -> Option<Arc<RegisteredType>> {
        self.get(base).or_else(|| {
            let short = base.rsplit('.').next()?;
            (short != base).then(|| self.get(short)).flatten()
        })
    }
}
