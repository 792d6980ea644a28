//! Test harness: a small host object model and both binders over it
//!
//! Modules:
//! - `framework`: `Control` (protected `Tag`)
//! - `app`: everything else; the compiling binder owns this module with
//!   `app.Window` as designated owner type. `app.Frame` takes controls
//!   through `Control`-typed parameters

#![allow(dead_code)]

use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use weft_runtime::{
    BindMode, BinderOptions, CompilingBinder, ConverterCache, OwningModule, ReflectiveBinder,
    RuntimeBinder,
};
use weft_schema::{
    DeferringLoaderDescriptor, MemberDescriptor, TypeBuilder, TypeConverterDescriptor, TypeKey,
    TypeRegistry, Visibility,
};
use weft_sdk::{
    AttachableMemberId, AttachedPropertyStore, ComponentConnector, ContentSource, DeferringLoader,
    DictionaryEnumerator, DictionaryItems, HostError, HostResult, IndexedContent, ItemIter,
    KeyValuePair, MarkupExtension, NodeList, ParamType, Ref, Rest, ServiceContext,
    SupportInitialize, TypeConverter, TypedPairIter, UriContext, Value, ValueKind,
};

// ============================================================================
// Host types
// ============================================================================

/// Records which constructor built it
#[derive(Default)]
pub struct Recorder {
    pub recorded: Option<i64>,
    pub title: Mutex<String>,
    pub secret: Mutex<Option<String>>,
    pub clicks: Mutex<Vec<String>>,
}

impl Recorder {
    fn with(n: i64) -> Self {
        Self {
            recorded: Some(n),
            ..Self::default()
        }
    }
}

pub struct Control {
    pub tag: Mutex<String>,
}

pub struct Window {
    pub control: Control,
    pub events: Mutex<Vec<String>>,
    pub base_uri: Mutex<Option<String>>,
    pub connected: Mutex<Vec<i32>>,
}

impl SupportInitialize for Window {
    fn begin_init(&self) -> HostResult<()> {
        self.events.lock().push("begin".to_string());
        Ok(())
    }

    fn end_init(&self) -> HostResult<()> {
        self.events.lock().push("end".to_string());
        Ok(())
    }
}

impl ComponentConnector for Window {
    fn connect(&self, connection_id: i32, _target: &Value) -> HostResult<()> {
        if connection_id < 0 {
            return Err(HostError::Argument(format!("bad connection id {}", connection_id)));
        }
        self.connected.lock().push(connection_id);
        Ok(())
    }
}

impl UriContext for Window {
    fn set_base_uri(&self, uri: &str) -> HostResult<()> {
        *self.base_uri.lock() = Some(uri.to_string());
        Ok(())
    }

    fn base_uri(&self) -> Option<String> {
        self.base_uri.lock().clone()
    }
}

/// Only reachable through its private and internal constructors
pub struct Sealed {
    pub value: i64,
}

pub struct Exploding;

pub struct Panel {
    pub items: Mutex<Vec<Value>>,
}

pub struct NullPanel;

#[derive(Default)]
pub struct Frame {
    pub content: Mutex<Option<Ref<Control>>>,
    pub children: Mutex<Vec<String>>,
}

impl Frame {
    fn around(content: Ref<Control>) -> Self {
        Self {
            content: Mutex::new(Some(content)),
            ..Self::default()
        }
    }
}

pub struct StaticResource {
    pub key: String,
}

impl MarkupExtension for StaticResource {
    fn provide_value(&self, _ctx: &ServiceContext) -> HostResult<Value> {
        if self.key.is_empty() {
            return Err(HostError::from("resource key is empty"));
        }
        Ok(Value::str(format!("resource:{}", self.key)))
    }
}

// ---- dictionaries, one per iterator shape ----

pub struct EntryShape;
pub struct TypedShape;
pub struct GenericShape;

pub struct Dict<S> {
    pub entries: Mutex<Vec<(String, i64)>>,
    _shape: PhantomData<S>,
}

impl<S> Dict<S> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            _shape: PhantomData,
        }
    }
}

struct VecEnumerator {
    entries: std::vec::IntoIter<(String, i64)>,
}

impl DictionaryEnumerator for VecEnumerator {
    fn next_entry(&mut self) -> HostResult<Option<(Value, Value)>> {
        Ok(self.entries.next().map(|(k, v)| (Value::str(k), Value::Int(v))))
    }
}

// ============================================================================
// Converters, loaders, content, attached properties
// ============================================================================

/// `255` <-> `"0xff"`
#[derive(Default)]
pub struct HexConverter;

impl TypeConverter for HexConverter {
    fn can_convert_from(&self, _ctx: &ServiceContext, source: ValueKind) -> bool {
        source == ValueKind::Str
    }

    fn convert_from(&self, _ctx: &ServiceContext, value: &Value) -> HostResult<Value> {
        let text = value.as_str().ok_or_else(|| HostError::InvalidCast {
            expected: "string".to_string(),
            got: value.type_name().to_string(),
        })?;
        let digits = text
            .strip_prefix("0x")
            .ok_or_else(|| HostError::Argument(format!("'{}' is not hex", text)))?;
        i64::from_str_radix(digits, 16)
            .map(Value::Int)
            .map_err(|e| HostError::Argument(e.to_string()))
    }

    fn convert_to_string(&self, _ctx: &ServiceContext, value: &Value) -> HostResult<String> {
        let n = value.as_int().ok_or_else(|| HostError::InvalidCast {
            expected: "int".to_string(),
            got: value.type_name().to_string(),
        })?;
        Ok(format!("0x{:x}", n))
    }
}

/// Declines everything; only converts when the legacy bypass forces it
#[derive(Default)]
pub struct ShyConverter;

impl TypeConverter for ShyConverter {
    fn can_convert_from(&self, _ctx: &ServiceContext, _source: ValueKind) -> bool {
        false
    }

    fn convert_from(&self, _ctx: &ServiceContext, value: &Value) -> HostResult<Value> {
        Ok(Value::str(value.to_string().to_uppercase()))
    }
}

/// Reads every node into a list
#[derive(Default)]
pub struct ListLoader;

impl DeferringLoader for ListLoader {
    fn load(&self, content: &mut dyn ContentSource, _ctx: &ServiceContext) -> HostResult<Value> {
        let mut nodes = Vec::new();
        while let Some(node) = content.read()? {
            nodes.push(node);
        }
        Ok(Value::list(nodes))
    }

    fn save(&self, value: &Value, _ctx: &ServiceContext) -> HostResult<Box<dyn ContentSource>> {
        let nodes = value.as_list().map(<[Value]>::to_vec).unwrap_or_default();
        Ok(Box::new(NodeList::new(nodes)))
    }
}

/// Reads one node, then fails
#[derive(Default)]
pub struct FailingLoader;

impl DeferringLoader for FailingLoader {
    fn load(&self, content: &mut dyn ContentSource, _ctx: &ServiceContext) -> HostResult<Value> {
        content.read()?;
        Err(HostError::from("truncated subtree"))
    }

    fn save(&self, _value: &Value, _ctx: &ServiceContext) -> HostResult<Box<dyn ContentSource>> {
        Err(HostError::NotSupported("save".to_string()))
    }
}

/// Indexed content source that counts resets to "unset"
pub struct RecordingSource {
    inner: NodeList,
    pub resets: Arc<AtomicUsize>,
}

impl RecordingSource {
    pub fn new(nodes: Vec<Value>) -> Self {
        Self {
            inner: NodeList::new(nodes),
            resets: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl ContentSource for RecordingSource {
    fn read(&mut self) -> HostResult<Option<Value>> {
        self.inner.read()
    }

    fn as_indexed(&mut self) -> Option<&mut dyn IndexedContent> {
        Some(self)
    }
}

impl IndexedContent for RecordingSource {
    fn count(&self) -> usize {
        self.inner.count()
    }

    fn current_index(&self) -> Option<usize> {
        self.inner.current_index()
    }

    fn set_current_index(&mut self, index: Option<usize>) {
        if index.is_none() {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.set_current_index(index);
    }
}

/// Attached properties keyed by object identity
#[derive(Default)]
pub struct MapStore {
    entries: Mutex<Vec<(Value, AttachableMemberId, Value)>>,
}

impl MapStore {
    pub fn set(&self, instance: &Value, id: AttachableMemberId, value: Value) {
        self.entries.lock().push((instance.clone(), id, value));
    }
}

impl AttachedPropertyStore for MapStore {
    fn property_count(&self, instance: &Value) -> HostResult<usize> {
        Ok(self.entries.lock().iter().filter(|(owner, _, _)| owner.same(instance)).count())
    }

    fn properties(&self, instance: &Value) -> HostResult<Vec<(AttachableMemberId, Value)>> {
        if instance.is_null() {
            return Err(HostError::Argument("null instance".to_string()));
        }
        Ok(self
            .entries
            .lock()
            .iter()
            .filter(|(owner, _, _)| owner.same(instance))
            .map(|(_, id, value)| (id.clone(), value.clone()))
            .collect())
    }
}

// ============================================================================
// Registration
// ============================================================================

pub struct Fixture {
    pub registry: Arc<TypeRegistry>,
    pub recorder: TypeKey,
    pub control: TypeKey,
    pub window: TypeKey,
    pub sealed: TypeKey,
    pub exploding: TypeKey,
    pub panel: TypeKey,
    pub null_panel: TypeKey,
    pub frame: TypeKey,
    pub entry_dict: TypeKey,
    pub typed_dict: TypeKey,
    pub generic_dict: TypeKey,
    pub resource: TypeKey,
    pub unknown: TypeKey,
    pub click_handler: TypeKey,
}

fn register_dict<S: Send + Sync + 'static>(
    reg: &mut TypeRegistry,
    name: &str,
    items: fn(Vec<(String, i64)>) -> DictionaryItems,
) -> TypeKey {
    let app = reg.module("app");
    reg.register(
        TypeBuilder::<Dict<S>>::new(name, app)
            .constructor(Visibility::Public, || -> HostResult<Dict<S>> { Ok(Dict::new()) })
            .dictionary(|d: &Dict<S>, k: String, v: i64| {
                d.entries.lock().push((k, v));
                Ok(())
            })
            .dictionary_items(move |d: &Dict<S>| Ok(Some(items(d.entries.lock().clone())))),
    )
    .unwrap()
}

fn entry_items(entries: Vec<(String, i64)>) -> DictionaryItems {
    DictionaryItems::Entries(Box::new(VecEnumerator {
        entries: entries.into_iter(),
    }))
}

fn typed_items(entries: Vec<(String, i64)>) -> DictionaryItems {
    let iter: TypedPairIter<String, i64> = Box::new(entries.into_iter().map(Ok::<_, HostError>));
    DictionaryItems::typed(iter)
}

fn generic_items(entries: Vec<(String, i64)>) -> DictionaryItems {
    let iter: ItemIter = Box::new(
        entries
            .into_iter()
            .map(|(k, v)| Ok(KeyValuePair::new(Value::str(k), Value::Int(v)).into_value())),
    );
    DictionaryItems::generic(iter)
}

pub fn fixture() -> Fixture {
    let mut reg = TypeRegistry::new();
    let framework = reg.module("framework");
    let app = reg.module("app");

    let recorder = reg
        .register(
            TypeBuilder::<Recorder>::new("app.Recorder", app)
                .constructor(Visibility::Public, || -> HostResult<Recorder> {
                    Ok(Recorder::default())
                })
                .constructor(Visibility::Public, |n: i64| -> HostResult<Recorder> {
                    Ok(Recorder::with(n))
                })
                .static_method("Create", Visibility::Public, |n: i64| -> HostResult<Arc<Recorder>> {
                    Ok(Arc::new(Recorder::with(n)))
                })
                .static_method(
                    "Nothing",
                    Visibility::Public,
                    || -> HostResult<Option<Arc<Recorder>>> { Ok(None) },
                )
                .static_method("Broken", Visibility::Public, || -> HostResult<Arc<Recorder>> {
                    Err(HostError::from("factory broke"))
                })
                .static_method("Sum", Visibility::Public, |values: Rest<i64>| -> HostResult<i64> {
                    Ok(values.0.iter().sum())
                })
                .property::<String>("Title", |p| {
                    p.getter(|r: &Recorder| Ok(r.title.lock().clone()))
                        .setter(|r: &Recorder, v: String| {
                            *r.title.lock() = v;
                            Ok(())
                        })
                        .should_serialize(|r: &Recorder| Ok(!r.title.lock().is_empty()))
                })
                .property::<String>("Secret", |p| {
                    p.setter(|r: &Recorder, v: String| {
                        *r.secret.lock() = Some(v);
                        Ok(())
                    })
                })
                .property::<i64>("Recorded", |p| {
                    p.getter(|r: &Recorder| Ok(r.recorded.unwrap_or(-1)))
                })
                .property::<i64>("Depth", |p| {
                    p.getter(|_r: &Recorder| Err(HostError::StackOverflow))
                })
                .property::<String>("Fragile", |p| {
                    p.getter(|_r: &Recorder| Err(HostError::from("getter broke")))
                        .should_serialize(|_r: &Recorder| Err(HostError::from("hook broke")))
                })
                .property::<i64>("Hex", |p| {
                    p.getter(|r: &Recorder| Ok(r.recorded.unwrap_or(0)))
                        .converter(TypeConverterDescriptor::of::<HexConverter>(ParamType::Int))
                })
                .method(
                    "OnClick",
                    Visibility::Public,
                    |r: &Recorder, sender: String| -> HostResult<()> {
                        r.clicks.lock().push(sender);
                        Ok(())
                    },
                )
                .method(
                    "OnHiddenClick",
                    Visibility::Private,
                    |r: &Recorder, sender: String| -> HostResult<()> {
                        r.clicks.lock().push(format!("hidden:{}", sender));
                        Ok(())
                    },
                ),
        )
        .unwrap();

    let control = reg
        .register(
            TypeBuilder::<Control>::new("framework.Control", framework).property::<String>(
                "Tag",
                |p| {
                    p.visibility(Visibility::Protected)
                        .getter(|c: &Control| Ok(c.tag.lock().clone()))
                        .setter(|c: &Control, v: String| {
                            *c.tag.lock() = v;
                            Ok(())
                        })
                },
            ),
        )
        .unwrap();

    let window = reg
        .register(
            TypeBuilder::<Window>::new("app.Window", app)
                .base::<Control>(|w| &w.control)
                .constructor(Visibility::Public, || -> HostResult<Window> {
                    Ok(Window {
                        control: Control {
                            tag: Mutex::new("root".to_string()),
                        },
                        events: Mutex::new(Vec::new()),
                        base_uri: Mutex::new(None),
                        connected: Mutex::new(Vec::new()),
                    })
                })
                .supports_initialize()
                .component_connector()
                .uri_context(),
        )
        .unwrap();

    let sealed = reg
        .register(
            TypeBuilder::<Sealed>::new("app.Sealed", app)
                .constructor(Visibility::Private, || -> HostResult<Sealed> {
                    Ok(Sealed { value: 0 })
                })
                .constructor(Visibility::Internal, |value: i64| -> HostResult<Sealed> {
                    Ok(Sealed { value })
                })
                .property::<i64>("Value", |p| p.getter(|s: &Sealed| Ok(s.value))),
        )
        .unwrap();

    let exploding = reg
        .register(
            TypeBuilder::<Exploding>::new("app.Exploding", app)
                .constructor(Visibility::Public, || -> HostResult<Exploding> {
                    panic!("constructor exploded")
                }),
        )
        .unwrap();

    let panel = reg
        .register(
            TypeBuilder::<Panel>::new("app.Panel", app)
                .constructor(Visibility::Public, || -> HostResult<Panel> {
                    Ok(Panel {
                        items: Mutex::new(Vec::new()),
                    })
                })
                .collection_add(|p: &Panel, n: i64| -> HostResult<()> {
                    p.items.lock().push(Value::Int(n));
                    Ok(())
                })
                .collection_add(|p: &Panel, s: String| -> HostResult<()> {
                    if s.is_empty() {
                        return Err(HostError::Argument("empty child".to_string()));
                    }
                    p.items.lock().push(Value::str(format!("text:{}", s)));
                    Ok(())
                })
                .collection_items(|p: &Panel| {
                    let items = p.items.lock().clone();
                    let iter: ItemIter = Box::new(items.into_iter().map(Ok::<_, HostError>));
                    Ok(Some(iter))
                }),
        )
        .unwrap();

    let null_panel = reg
        .register(
            TypeBuilder::<NullPanel>::new("app.NullPanel", app)
                .constructor(Visibility::Public, || -> HostResult<NullPanel> { Ok(NullPanel) })
                .collection_items(|_p: &NullPanel| Ok(None)),
        )
        .unwrap();

    let frame = reg
        .register(
            TypeBuilder::<Frame>::new("app.Frame", app)
                .constructor(Visibility::Public, || -> HostResult<Frame> { Ok(Frame::default()) })
                .constructor(Visibility::Public, |content: Ref<Control>| -> HostResult<Frame> {
                    Ok(Frame::around(content))
                })
                .static_method(
                    "Around",
                    Visibility::Public,
                    |content: Ref<Control>| -> HostResult<Arc<Frame>> {
                        Ok(Arc::new(Frame::around(content)))
                    },
                )
                .property::<Option<Ref<Control>>>("Content", |p| {
                    p.getter(|f: &Frame| Ok(f.content.lock().clone()))
                        .setter(|f: &Frame, content: Option<Ref<Control>>| {
                            *f.content.lock() = content;
                            Ok(())
                        })
                })
                .property::<String>("ContentTag", |p| {
                    p.getter(|f: &Frame| {
                        let content = f.content.lock();
                        Ok(content.as_ref().map(|c| c.tag.lock().clone()).unwrap_or_default())
                    })
                })
                .collection_add(|f: &Frame, control: Ref<Control>| -> HostResult<()> {
                    f.children.lock().push(format!("control:{}", control.tag.lock()));
                    Ok(())
                })
                .collection_add(|f: &Frame, window: Ref<Window>| -> HostResult<()> {
                    f.children.lock().push(format!("window:{}", window.control.tag.lock()));
                    Ok(())
                }),
        )
        .unwrap();

    let entry_dict = register_dict::<EntryShape>(&mut reg, "app.EntryDict", entry_items);
    let typed_dict = register_dict::<TypedShape>(&mut reg, "app.TypedDict", typed_items);
    let generic_dict = register_dict::<GenericShape>(&mut reg, "app.GenericDict", generic_items);

    let resource = reg
        .register(TypeBuilder::<StaticResource>::new("app.StaticResource", app).markup_extension())
        .unwrap();

    let unknown = reg.register_unknown("app.Unresolved", app).unwrap();
    let click_handler = reg
        .register_delegate("app.ClickHandler", app, vec![ParamType::Str])
        .unwrap();

    Fixture {
        registry: Arc::new(reg),
        recorder,
        control,
        window,
        sealed,
        exploding,
        panel,
        null_panel,
        frame,
        entry_dict,
        typed_dict,
        generic_dict,
        resource,
        unknown,
        click_handler,
    }
}

// ============================================================================
// Binders
// ============================================================================

impl Fixture {
    /// Owner rights used by the compiling binder
    pub fn owner(&self) -> OwningModule {
        let app = self.registry.module_by_name("app").unwrap();
        OwningModule::new(app).with_owner_type(self.window)
    }

    pub fn reflective(&self, options: BinderOptions) -> ReflectiveBinder {
        ReflectiveBinder::new(Arc::clone(&self.registry), options)
    }

    pub fn compiling(&self, options: BinderOptions) -> CompilingBinder {
        CompilingBinder::new(Arc::clone(&self.registry), self.owner(), options)
    }

    /// Both backends in read mode
    pub fn binders(&self) -> Vec<Arc<dyn RuntimeBinder>> {
        self.binders_with(BinderOptions::new(BindMode::Read))
    }

    pub fn binders_with(&self, options: BinderOptions) -> Vec<Arc<dyn RuntimeBinder>> {
        vec![
            Arc::new(self.reflective(options.clone())),
            Arc::new(self.compiling(options)),
        ]
    }

    pub fn member(&self, ty: TypeKey, name: &str) -> Arc<MemberDescriptor> {
        Arc::clone(self.registry.find_member(ty, name).unwrap())
    }

    pub fn new_window(&self, binder: &dyn RuntimeBinder) -> Value {
        binder.create_instance(self.window, &[]).unwrap()
    }
}

pub fn shared_cache() -> Arc<ConverterCache> {
    Arc::new(ConverterCache::new())
}

pub fn hex() -> TypeConverterDescriptor {
    TypeConverterDescriptor::of::<HexConverter>(ParamType::Int)
}

pub fn shy() -> TypeConverterDescriptor {
    TypeConverterDescriptor::of::<ShyConverter>(ParamType::Str)
}

pub fn list_loader() -> DeferringLoaderDescriptor {
    DeferringLoaderDescriptor::of::<ListLoader>(ParamType::List(Box::new(ParamType::Any)))
}

pub fn failing_loader() -> DeferringLoaderDescriptor {
    DeferringLoaderDescriptor::of::<FailingLoader>(ParamType::Any)
}

/// Marker identifying a loader whose factory yields no instance
pub struct AbsentLoader;

pub fn absent_loader() -> DeferringLoaderDescriptor {
    DeferringLoaderDescriptor::with_factory::<AbsentLoader>(ParamType::Any, || Ok(None))
}

/// Converter whose factory fails
pub struct BrokenConverter;

pub fn broken_converter() -> TypeConverterDescriptor {
    TypeConverterDescriptor::with_factory::<BrokenConverter>(ParamType::Int, || {
        Err(HostError::from("converter factory failed"))
    })
}
