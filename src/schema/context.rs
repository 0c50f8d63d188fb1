//! The type-universe cache: the entry point external callers resolve through.
//!
//! [`XamlSchemaContext`] owns the two keyed descriptor caches (by handle, by
//! normalized name), the lazily populated assembly search set and the
//! construct-and-insert lock. [`MetadataProvider`] is the thin per-consumer handle;
//! any number of providers can share one context, which is what makes the caches
//! process-wide without any global state.
//!
//! # Identity
//!
//! Two resolution requests for the same host type must yield the same descriptor
//! instance, because downstream code compares descriptors by reference. The whole
//! "check, construct if missing, insert" sequence therefore runs under a single
//! coarse lock rather than split critical sections.
//!
//! # Name resolution
//!
//! Textual names normalize to compiler syntax first. A name containing a generic
//! marker goes through the two-stack construction scan (see
//! [`XamlSchemaContext::resolve_name`]); anything else is a linear walk across the
//! assembly search set. Ordinary misses come back as `Ok(None)` at every layer;
//! only malformed scans and normalizer/resolver disagreements are errors.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;

use crate::host::{
    enumerate_modules, HostTypeRc, HostUniverse, ModuleFileIdentity, TypeHandle, CORE_ASSEMBLY,
};
use crate::schema::naming;
use crate::schema::xamltype::{XamlType, XamlTypeRc};
use crate::{Error, Result};

/// Non-fatal conditions recorded while classifying types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaDiagnostic {
    /// More than one add-operation candidate matched during collection
    /// classification; the first one was kept.
    AmbiguousCollectionAdd {
        /// Full name of the type being classified
        type_name: String,
        /// The add-operation name that was ambiguous
        method: String,
        /// The arity that was being matched
        arity: usize,
    },
}

/// Configuration of a schema context.
#[derive(Debug, Clone, Default)]
pub struct SchemaOptions {
    /// Root storage folder enumerated into the assembly search set. When absent,
    /// the search set snapshots the assemblies registered with the universe at
    /// first use instead.
    pub module_root: Option<PathBuf>,
}

/// The write-once assembly search set.
///
/// Populated exactly once, on the first provider construction or the first name
/// resolution, whichever comes first; read-only thereafter. Assemblies registered
/// after population are not searched.
#[derive(Default)]
pub struct AssemblySearchSet {
    modules: OnceLock<Vec<ModuleFileIdentity>>,
}

impl AssemblySearchSet {
    /// Whether population has completed
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.modules.get().is_some()
    }

    /// The populated entries, if population has completed
    #[must_use]
    pub fn entries(&self) -> Option<&[ModuleFileIdentity]> {
        self.modules.get().map(Vec::as_slice)
    }
}

/// The shared resolution service: caches, search set and universe access.
pub struct XamlSchemaContext {
    universe: Arc<HostUniverse>,
    options: SchemaOptions,
    /// Primary descriptor cache, keyed by host type handle
    by_handle: SkipMap<TypeHandle, XamlTypeRc>,
    /// Secondary descriptor cache, keyed by normalized requested name
    by_name: DashMap<String, XamlTypeRc>,
    /// Guards the whole check-construct-insert sequence
    build_lock: Mutex<()>,
    search_set: AssemblySearchSet,
    diagnostics: Mutex<Vec<SchemaDiagnostic>>,
}

impl XamlSchemaContext {
    /// Create a context over a host universe with default options
    #[must_use]
    pub fn new(universe: &Arc<HostUniverse>) -> Arc<Self> {
        Self::with_options(universe, SchemaOptions::default())
    }

    /// Create a context over a host universe with explicit options
    #[must_use]
    pub fn with_options(universe: &Arc<HostUniverse>, options: SchemaOptions) -> Arc<Self> {
        Arc::new(XamlSchemaContext {
            universe: universe.clone(),
            options,
            by_handle: SkipMap::new(),
            by_name: DashMap::new(),
            build_lock: Mutex::new(()),
            search_set: AssemblySearchSet::default(),
            diagnostics: Mutex::new(Vec::new()),
        })
    }

    /// The host universe this context resolves against
    #[must_use]
    pub fn universe(&self) -> &Arc<HostUniverse> {
        &self.universe
    }

    /// The write-once assembly search set
    #[must_use]
    pub fn search_set(&self) -> &AssemblySearchSet {
        &self.search_set
    }

    /// Number of descriptors materialized so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    /// Whether no descriptor has been materialized yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }

    pub(crate) fn report_diagnostic(&self, diagnostic: SchemaDiagnostic) {
        self.diagnostics
            .lock()
            .expect("Failed to acquire lock")
            .push(diagnostic);
    }

    /// Diagnostics recorded so far, in emission order
    #[must_use]
    pub fn diagnostics(&self) -> Vec<SchemaDiagnostic> {
        self.diagnostics
            .lock()
            .expect("Failed to acquire lock")
            .clone()
    }

    /// Populate the assembly search set if that has not happened yet, and return
    /// the entries.
    ///
    /// The core runtime assembly always leads the search order. With a configured
    /// module root the remaining entries come from enumerating that folder;
    /// otherwise the registered universe assemblies are snapshotted.
    pub fn ensure_search_set(&self) -> &[ModuleFileIdentity] {
        self.search_set.modules.get_or_init(|| {
            let mut entries = vec![ModuleFileIdentity::synthesized(CORE_ASSEMBLY)];
            match &self.options.module_root {
                Some(root) => entries.extend(enumerate_modules(root)),
                None => {
                    for name in self.universe.assembly_names() {
                        if name != CORE_ASSEMBLY {
                            entries.push(ModuleFileIdentity::synthesized(&name));
                        }
                    }
                }
            }
            log::debug!("assembly search set populated with {} entries", entries.len());
            entries
        })
    }

    /// Resolve a descriptor by host type handle.
    ///
    /// Cache hits return immediately; misses construct under the build lock so a
    /// racing resolution of the same handle observes exactly one descriptor.
    /// Unknown handles are an ordinary miss.
    #[must_use]
    pub fn resolve(self: &Arc<Self>, handle: TypeHandle) -> Option<XamlTypeRc> {
        if let Some(entry) = self.by_handle.get(&handle) {
            return Some(entry.value().clone());
        }
        let host = self.universe.get(handle)?;
        let _guard = self.build_lock.lock().expect("Failed to acquire lock");
        Some(self.resolve_host_locked(&host))
    }

    /// Construct-or-fetch while already holding the build lock. Item and key types
    /// are resolved eagerly right after insertion, so self-referential collections
    /// terminate instead of recursing.
    fn resolve_host_locked(self: &Arc<Self>, host: &HostTypeRc) -> XamlTypeRc {
        if let Some(entry) = self.by_handle.get(&host.handle) {
            return entry.value().clone();
        }
        let built = XamlType::build(self, host);
        self.by_handle.insert(host.handle, built.descriptor.clone());

        let item = built
            .item_host
            .as_ref()
            .map(|item| self.resolve_host_locked(item));
        let key = built
            .key_host
            .as_ref()
            .map(|key| self.resolve_host_locked(key));
        built.descriptor.seal_item_types(item, key);
        built.descriptor
    }

    /// Resolve a descriptor by textual name.
    ///
    /// The name is normalized to compiler syntax first. Names carrying a generic
    /// marker go through the construction grammar; everything else is a linear
    /// search across the assembly search set.
    ///
    /// # Errors
    /// [`Error::MalformedTypeName`] when a generic name ends the scan with a
    /// malformed stack, [`Error::NameMismatchAfterResolve`] when a freshly resolved
    /// descriptor renders a different canonical name than requested. Unresolved
    /// names are an ordinary miss, `Ok(None)`.
    pub fn resolve_name(self: &Arc<Self>, name: &str) -> Result<Option<XamlTypeRc>> {
        let normalized = naming::to_compiler_syntax(name);
        if let Some(hit) = self.by_name.get(&normalized) {
            return Ok(Some(hit.clone()));
        }

        let resolved = if normalized.contains('<') {
            self.construct_generic(&normalized)?
        } else {
            self.resolve_simple_name(&normalized)?
        };

        if let Some(descriptor) = &resolved {
            self.by_name
                .entry(normalized)
                .or_insert_with(|| descriptor.clone());
            self.by_name
                .entry(descriptor.full_name().to_string())
                .or_insert_with(|| descriptor.clone());
        }
        Ok(resolved)
    }

    /// Linear search for a non-generic name across the assembly search set,
    /// asserting afterwards that the normalizer and the resolver agree on the
    /// canonical form.
    fn resolve_simple_name(self: &Arc<Self>, normalized: &str) -> Result<Option<XamlTypeRc>> {
        let reflection = naming::csharp_style_name(normalized);
        for identity in self.ensure_search_set() {
            let Some(assembly) = self.universe.assembly(&identity.name) else {
                continue;
            };
            let Some(host) = assembly.get_type(&reflection) else {
                continue;
            };
            let Some(descriptor) = self.resolve(host.handle) else {
                return Ok(None);
            };
            let expected = naming::standard_name(normalized);
            if descriptor.full_name() != expected {
                return Err(Error::NameMismatchAfterResolve {
                    requested: normalized.to_string(),
                    resolved: descriptor.full_name().to_string(),
                });
            }
            return Ok(Some(descriptor));
        }
        log::debug!("no assembly in the search set resolves '{reflection}'");
        Ok(None)
    }

    /// Resolve the text accumulated before a `<` as a generic type definition.
    /// The arity is not known yet at this point, so the arity-stripped index is
    /// consulted when no exact name matches.
    fn resolve_definition(&self, text: &str) -> Option<HostTypeRc> {
        let reflection = naming::csharp_style_name(text);
        for identity in self.ensure_search_set() {
            let Some(assembly) = self.universe.assembly(&identity.name) else {
                continue;
            };
            if let Some(host) = assembly.get_type(&reflection) {
                if host.is_generic_definition() {
                    return Some(host);
                }
            }
            if let Some(host) = assembly.generic_definition(&reflection) {
                return Some(host);
            }
        }
        None
    }

    /// Re-resolve a definition once the argument count is known, for names where
    /// several arities share a stripped name.
    fn resolve_definition_with_arity(&self, stripped: &str, arity: usize) -> Option<HostTypeRc> {
        for identity in self.ensure_search_set() {
            let Some(assembly) = self.universe.assembly(&identity.name) else {
                continue;
            };
            if let Some(host) = assembly.generic_definition_with_arity(stripped, arity) {
                return Some(host);
            }
        }
        None
    }

    /// Resolve one flushed argument segment of the construction scan.
    fn resolve_argument(self: &Arc<Self>, text: &str) -> Result<Option<XamlTypeRc>> {
        if let Some(hit) = self.by_name.get(text) {
            return Ok(Some(hit.clone()));
        }
        self.resolve_simple_name(text)
    }

    /// The generic-name construction grammar: one left-to-right character scan
    /// maintaining two parallel stacks, one of argument lists under construction
    /// and one of definitions awaiting their arguments.
    ///
    /// An unresolved segment degrades to `Ok(None)`; a final stack depth other
    /// than exactly one is a malformed-input error.
    fn construct_generic(self: &Arc<Self>, name: &str) -> Result<Option<XamlTypeRc>> {
        let mut buf = String::new();
        let mut lists: Vec<Vec<XamlTypeRc>> = Vec::new();
        let mut defs: Vec<HostTypeRc> = Vec::new();
        let mut done: Vec<XamlTypeRc> = Vec::new();

        for ch in name.chars() {
            match ch {
                '<' => {
                    let Some(def) = self.resolve_definition(&buf) else {
                        return Ok(None);
                    };
                    defs.push(def);
                    buf.clear();
                    lists.push(Vec::new());
                }
                ',' => {
                    if !buf.is_empty() {
                        let Some(arg) = self.resolve_argument(&buf)? else {
                            return Ok(None);
                        };
                        match lists.last_mut() {
                            Some(list) => list.push(arg),
                            None => return Err(Error::MalformedTypeName(name.to_string())),
                        }
                        buf.clear();
                    }
                }
                '>' => {
                    if !buf.is_empty() {
                        let Some(arg) = self.resolve_argument(&buf)? else {
                            return Ok(None);
                        };
                        match lists.last_mut() {
                            Some(list) => list.push(arg),
                            None => return Err(Error::MalformedTypeName(name.to_string())),
                        }
                        buf.clear();
                    }
                    let Some(args) = lists.pop() else {
                        return Err(Error::MalformedTypeName(name.to_string()));
                    };
                    let Some(mut def) = defs.pop() else {
                        return Err(Error::MalformedTypeName(name.to_string()));
                    };

                    if def.generic_params.len() != args.len() {
                        let stripped = naming::strip_arity(&def.full_name()).to_string();
                        match self.resolve_definition_with_arity(&stripped, args.len()) {
                            Some(exact) => def = exact,
                            None => return Ok(None),
                        }
                    }

                    let mut arg_hosts = Vec::with_capacity(args.len());
                    for arg in &args {
                        let host = arg.host().ok_or_else(|| {
                            internal_error!("host type dropped for '{}'", arg.full_name())
                        })?;
                        arg_hosts.push(host);
                    }
                    let instance = self.universe.make_generic(&def, &arg_hosts);
                    let Some(descriptor) = self.resolve(instance.handle) else {
                        return Ok(None);
                    };

                    match lists.last_mut() {
                        Some(outer) => outer.push(descriptor),
                        None => done.push(descriptor),
                    }
                }
                ' ' => {}
                other => buf.push(other),
            }
        }

        if !buf.is_empty() || !lists.is_empty() || !defs.is_empty() || done.len() != 1 {
            return Err(Error::MalformedTypeName(name.to_string()));
        }
        Ok(done.pop())
    }
}

impl std::fmt::Debug for XamlSchemaContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XamlSchemaContext")
            .field("descriptors", &self.by_handle.len())
            .field("search_set_populated", &self.search_set.is_populated())
            .finish_non_exhaustive()
    }
}

/// Thin per-consumer handle over a shared [`XamlSchemaContext`].
///
/// Constructing a provider triggers the one-time assembly search set population;
/// any number of providers can coexist over the same context and share its caches.
#[derive(Debug, Clone)]
pub struct MetadataProvider {
    context: Arc<XamlSchemaContext>,
}

impl MetadataProvider {
    /// Create a provider over a shared context, populating the assembly search
    /// set if this is the first provider.
    #[must_use]
    pub fn new(context: &Arc<XamlSchemaContext>) -> Self {
        context.ensure_search_set();
        MetadataProvider {
            context: context.clone(),
        }
    }

    /// The shared context this provider resolves through
    #[must_use]
    pub fn context(&self) -> &Arc<XamlSchemaContext> {
        &self.context
    }

    /// Resolve a descriptor by host type handle; see [`XamlSchemaContext::resolve`]
    #[must_use]
    pub fn resolve(&self, handle: TypeHandle) -> Option<XamlTypeRc> {
        self.context.resolve(handle)
    }

    /// Resolve a descriptor by textual name; see [`XamlSchemaContext::resolve_name`]
    ///
    /// # Errors
    /// Propagates [`Error::MalformedTypeName`] and [`Error::NameMismatchAfterResolve`];
    /// unresolved names are `Ok(None)`.
    pub fn resolve_name(&self, name: &str) -> Result<Option<XamlTypeRc>> {
        self.context.resolve_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostTypeBuilder;

    fn universe_with_app() -> (Arc<HostUniverse>, Arc<XamlSchemaContext>) {
        let universe = HostUniverse::new();
        let assembly = universe.register_assembly("App");
        let list = HostTypeBuilder::new(&universe, &assembly, "", "List`1").generic_params(&["T"]);
        let item = list.generic_param(0);
        let _ = list.collection_of(&item).register();
        let dictionary =
            HostTypeBuilder::new(&universe, &assembly, "", "Dictionary`2").generic_params(&["K", "V"]);
        let (key, value) = (dictionary.generic_param(0), dictionary.generic_param(1));
        let _ = dictionary.dictionary_of(&key, &value).register();
        let context = XamlSchemaContext::new(&universe);
        (universe, context)
    }

    #[test]
    fn test_handle_resolution_is_referentially_identical() {
        let (universe, context) = universe_with_app();
        let handle = universe.core().boolean.handle;
        let first = context.resolve(handle).unwrap();
        let second = context.resolve(handle).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_name_and_handle_paths_agree() {
        let (universe, context) = universe_with_app();
        let by_name = context.resolve_name("Boolean").unwrap().unwrap();
        let by_handle = context.resolve(universe.core().boolean.handle).unwrap();
        assert!(Arc::ptr_eq(&by_name, &by_handle));
    }

    #[test]
    fn test_generic_construction_round_trip() {
        let (_, context) = universe_with_app();
        let resolved = context
            .resolve_name("Dictionary<String, List<Int32>>")
            .unwrap()
            .unwrap();
        assert_eq!(resolved.full_name(), "Dictionary<String, List<Int32>>");

        // Space placement in the request does not affect the constructed identity.
        let respaced = context
            .resolve_name("Dictionary<String,List<Int32>>")
            .unwrap()
            .unwrap();
        assert!(Arc::ptr_eq(&resolved, &respaced));
    }

    #[test]
    fn test_unresolved_segment_degrades_to_none() {
        let (_, context) = universe_with_app();
        assert!(context.resolve_name("NoSuch<Int32>").unwrap().is_none());
        assert!(context.resolve_name("List<NoSuchItem>").unwrap().is_none());
        assert!(context.resolve_name("App.Missing").unwrap().is_none());
    }

    #[test]
    fn test_malformed_generic_names_are_internal_errors() {
        let (_, context) = universe_with_app();
        assert!(matches!(
            context.resolve_name("List<Int32"),
            Err(Error::MalformedTypeName(_))
        ));
        assert!(matches!(
            context.resolve_name("List<Int32>>"),
            Err(Error::MalformedTypeName(_))
        ));
    }

    #[test]
    fn test_search_set_populates_once() {
        let (_, context) = universe_with_app();
        assert!(!context.search_set().is_populated());
        let provider = MetadataProvider::new(&context);
        assert!(context.search_set().is_populated());
        let entries = context.search_set().entries().unwrap();
        assert_eq!(entries[0].name, CORE_ASSEMBLY);
        assert!(entries.iter().any(|entry| entry.name == "App"));
        let _ = provider;
    }

    #[test]
    fn test_providers_share_context_caches() {
        let (universe, context) = universe_with_app();
        let first = MetadataProvider::new(&context);
        let second = MetadataProvider::new(&context);
        let handle = universe.core().string.handle;
        let a = first.resolve(handle).unwrap();
        let b = second.resolve(handle).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(context.len(), 1);
    }
}
