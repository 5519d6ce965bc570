//! Per-type member descriptors and the process-wide descriptor cache.
//!
//! Every registered type describes itself once through [`descriptor_of`]:
//! member accessors, equality operations for leaf types, constructors, and
//! the enumerable flag. The resulting [`TypeInfo`] is leaked into a
//! `'static` allocation and memoized in a lock-guarded map keyed by
//! [`TypeId`], so descriptor population is safe under concurrent first
//! access and free afterwards.

use std::any::TypeId;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::{AccessFault, CopyError};
use crate::value::Structural;

type GetFn = Box<dyn Fn(&dyn Structural) -> Result<&dyn Structural, AccessFault> + Send + Sync>;
type GetMutFn =
    Box<dyn Fn(&mut dyn Structural) -> Result<&mut dyn Structural, AccessFault> + Send + Sync>;
type SetFn =
    Box<dyn Fn(&mut dyn Structural, Box<dyn Structural>) -> Result<(), CopyError> + Send + Sync>;
type CtorFn = Box<dyn Fn() -> Box<dyn Structural> + Send + Sync>;
type CopyCtorFn = Box<dyn Fn(&dyn Structural) -> Option<Box<dyn Structural>> + Send + Sync>;
type EqFn = Box<dyn Fn(&dyn Structural, &dyn Structural) -> Option<bool> + Send + Sync>;
type RenderFn = Box<dyn Fn(&dyn Structural) -> String + Send + Sync>;
type CloneFn = Box<dyn Fn(&dyn Structural) -> Option<Box<dyn Structural>> + Send + Sync>;

/// Value operations for a Simple-classified type.
pub struct SimpleOps {
    equals: EqFn,
    render: RenderFn,
    clone_value: CloneFn,
}

impl SimpleOps {
    /// Value equality; `None` when either side is not the registered type or
    /// the comparison itself failed.
    pub fn equals(&self, a: &dyn Structural, b: &dyn Structural) -> Option<bool> {
        (self.equals)(a, b)
    }

    /// Render a value for difference reporting.
    pub fn render(&self, value: &dyn Structural) -> String {
        (self.render)(value)
    }

    /// Value copy; `None` when the value is not the registered type.
    pub fn clone_value(&self, value: &dyn Structural) -> Option<Box<dyn Structural>> {
        (self.clone_value)(value)
    }
}

/// A named, readable member eligible for traversal.
pub struct MemberDescriptor {
    name: &'static str,
    excluded: bool,
    get: GetFn,
    get_mut: Option<GetMutFn>,
    set: Option<SetFn>,
}

impl MemberDescriptor {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the member carries the non-comparable marker.
    pub fn is_excluded(&self) -> bool {
        self.excluded
    }

    /// Whether the member accepts whole-value assignment.
    pub fn is_writable(&self) -> bool {
        self.set.is_some()
    }

    /// Fetch the member value from its owner.
    pub fn value<'a>(&self, owner: &'a dyn Structural) -> Result<&'a dyn Structural, AccessFault> {
        (self.get)(owner)
    }

    /// Mutable access to the member value on the owner.
    pub fn value_mut<'a>(
        &self,
        owner: &'a mut dyn Structural,
    ) -> Result<&'a mut dyn Structural, AccessFault> {
        match &self.get_mut {
            Some(get_mut) => get_mut(owner),
            None => Err(AccessFault::new(format!(
                "member `{}` has no mutable access",
                self.name
            ))),
        }
    }

    /// Assign a new value to the member on the owner.
    pub fn assign(
        &self,
        owner: &mut dyn Structural,
        value: Box<dyn Structural>,
    ) -> Result<(), CopyError> {
        match &self.set {
            Some(set) => set(owner, value),
            None => Err(CopyError::Access(AccessFault::new(format!(
                "member `{}` is read-only",
                self.name
            )))),
        }
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("name", &self.name)
            .field("excluded", &self.excluded)
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// Cached structural description of a concrete runtime type.
///
/// Built once per type, never mutated or invalidated afterwards.
pub struct TypeInfo {
    name: &'static str,
    id: TypeId,
    members: Vec<MemberDescriptor>,
    simple: Option<SimpleOps>,
    enumerable: bool,
    constructor: Option<CtorFn>,
    copy_constructor: Option<CopyCtorFn>,
}

impl TypeInfo {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Members eligible for traversal, in registration order. Excluded
    /// members are filtered out.
    pub fn members(&self) -> impl Iterator<Item = &MemberDescriptor> {
        self.members.iter().filter(|member| !member.excluded)
    }

    /// Every registered member, excluded ones included.
    pub fn all_members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    /// Look up a member by name.
    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|member| member.name == name)
    }

    pub fn has_members(&self) -> bool {
        self.members.iter().any(|member| !member.excluded)
    }

    pub fn is_enumerable(&self) -> bool {
        self.enumerable
    }

    pub fn is_simple(&self) -> bool {
        self.simple.is_some()
    }

    pub fn simple_ops(&self) -> Option<&SimpleOps> {
        self.simple.as_ref()
    }

    pub fn has_copy_constructor(&self) -> bool {
        self.copy_constructor.is_some()
    }

    /// Instantiate through the registered default constructor.
    pub fn new_instance(&self) -> Option<Box<dyn Structural>> {
        self.constructor.as_ref().map(|ctor| ctor())
    }

    /// Instantiate through the registered copy constructor. `None` when no
    /// copy constructor is registered or the source has the wrong type.
    pub fn copy_instance(&self, source: &dyn Structural) -> Option<Box<dyn Structural>> {
        self.copy_constructor.as_ref().and_then(|ctor| ctor(source))
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("members", &self.members)
            .field("simple", &self.simple.is_some())
            .field("enumerable", &self.enumerable)
            .finish()
    }
}

/// Builder handed to the registration closure of [`descriptor_of`].
pub struct TypeBuilder<T> {
    members: Vec<MemberDescriptor>,
    simple: Option<SimpleOps>,
    enumerable: bool,
    constructor: Option<CtorFn>,
    copy_constructor: Option<CopyCtorFn>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Structural> TypeBuilder<T> {
    fn new() -> Self {
        Self {
            members: Vec::new(),
            simple: None,
            enumerable: false,
            constructor: None,
            copy_constructor: None,
            _marker: PhantomData,
        }
    }

    fn owner(owner: &dyn Structural) -> Result<&T, AccessFault> {
        owner.as_any().downcast_ref::<T>().ok_or_else(|| {
            AccessFault::new(format!("owner is not a `{}`", std::any::type_name::<T>()))
        })
    }

    fn owner_mut(owner: &mut dyn Structural) -> Result<&mut T, AccessFault> {
        owner.as_any_mut().downcast_mut::<T>().ok_or_else(|| {
            AccessFault::new(format!("owner is not a `{}`", std::any::type_name::<T>()))
        })
    }

    /// Register a read-write field.
    pub fn field<F, G, M>(&mut self, name: &'static str, get: G, get_mut: M)
    where
        F: Structural,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        self.push_field(name, false, get, get_mut);
    }

    /// Register a field that carries the non-comparable marker: it is never
    /// compared and never copied, but stays inspectable on the descriptor.
    pub fn field_excluded<F, G, M>(&mut self, name: &'static str, get: G, get_mut: M)
    where
        F: Structural,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        self.push_field(name, true, get, get_mut);
    }

    /// Register a field that cannot be reassigned wholesale. The copier
    /// updates its existing value in place.
    pub fn field_ro<F, G, M>(&mut self, name: &'static str, get: G, get_mut: M)
    where
        F: Structural,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        let getter: GetFn = Box::new(move |owner| Ok(get(Self::owner(owner)?) as &dyn Structural));
        let mutable: GetMutFn =
            Box::new(move |owner| Ok(get_mut(Self::owner_mut(owner)?) as &mut dyn Structural));
        self.members.push(MemberDescriptor {
            name,
            excluded: false,
            get: getter,
            get_mut: Some(mutable),
            set: None,
        });
    }

    /// Register a computed member with a fallible accessor. Compared only;
    /// the copier records it as skipped.
    pub fn computed<F, G>(&mut self, name: &'static str, get: G)
    where
        F: Structural,
        G: Fn(&T) -> Result<&F, AccessFault> + Send + Sync + 'static,
    {
        let getter: GetFn =
            Box::new(move |owner| Ok(get(Self::owner(owner)?)? as &dyn Structural));
        self.members.push(MemberDescriptor {
            name,
            excluded: false,
            get: getter,
            get_mut: None,
            set: None,
        });
    }

    fn push_field<F, G, M>(&mut self, name: &'static str, excluded: bool, get: G, get_mut: M)
    where
        F: Structural,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        let get_mut = Arc::new(get_mut);

        let getter: GetFn = Box::new(move |owner| Ok(get(Self::owner(owner)?) as &dyn Structural));
        let mutable: GetMutFn = {
            let get_mut = Arc::clone(&get_mut);
            Box::new(move |owner| Ok(get_mut(Self::owner_mut(owner)?) as &mut dyn Structural))
        };
        let setter: SetFn = {
            let get_mut = Arc::clone(&get_mut);
            Box::new(move |owner, value| {
                let owner = Self::owner_mut(owner)?;
                crate::value::assign_downcast(get_mut(owner), value)
            })
        };

        self.members.push(MemberDescriptor {
            name,
            excluded,
            get: getter,
            get_mut: Some(mutable),
            set: Some(setter),
        });
    }

    /// Compare and copy this type by value, using `PartialEq` and `Clone`.
    pub fn simple(&mut self)
    where
        T: PartialEq + Clone + fmt::Debug,
    {
        self.simple = Some(SimpleOps {
            equals: Box::new(|a: &dyn Structural, b: &dyn Structural| {
                let a = a.as_any().downcast_ref::<T>()?;
                let b = b.as_any().downcast_ref::<T>()?;
                Some(a == b)
            }),
            render: Box::new(|value: &dyn Structural| {
                match value.as_any().downcast_ref::<T>() {
                    Some(value) => format!("{:?}", value),
                    None => "<?>".to_string(),
                }
            }),
            clone_value: Box::new(|value: &dyn Structural| {
                value
                    .as_any()
                    .downcast_ref::<T>()
                    .map(|value| Box::new(value.clone()) as Box<dyn Structural>)
            }),
        });
    }

    /// Compare this type through its ordering: the fallback for types
    /// without a usable equality operator. An incomparable pair reads as a
    /// failed comparison and is reported unequal.
    pub fn simple_by_ordering(&mut self)
    where
        T: PartialOrd + Clone + fmt::Debug,
    {
        self.simple = Some(SimpleOps {
            equals: Box::new(|a: &dyn Structural, b: &dyn Structural| {
                let a = a.as_any().downcast_ref::<T>()?;
                let b = b.as_any().downcast_ref::<T>()?;
                a.partial_cmp(b).map(|ordering| ordering.is_eq())
            }),
            render: Box::new(|value: &dyn Structural| {
                match value.as_any().downcast_ref::<T>() {
                    Some(value) => format!("{:?}", value),
                    None => "<?>".to_string(),
                }
            }),
            clone_value: Box::new(|value: &dyn Structural| {
                value
                    .as_any()
                    .downcast_ref::<T>()
                    .map(|value| Box::new(value.clone()) as Box<dyn Structural>)
            }),
        });
    }

    /// Flag the type as exposing ordered element traversal.
    pub fn enumerable(&mut self) {
        self.enumerable = true;
    }

    /// Register the default constructor used by the copier.
    pub fn constructor<C>(&mut self, ctor: C)
    where
        C: Fn() -> T + Send + Sync + 'static,
    {
        self.constructor = Some(Box::new(move || Box::new(ctor()) as Box<dyn Structural>));
    }

    /// Use `Default::default` as the constructor.
    pub fn default_constructor(&mut self)
    where
        T: Default,
    {
        self.constructor(T::default);
    }

    /// Register a copy constructor. The copier prefers it over member-wise
    /// cloning — the cheapest correct clone for types that manage their own
    /// copy semantics.
    pub fn copy_constructor<C>(&mut self, ctor: C)
    where
        C: Fn(&T) -> T + Send + Sync + 'static,
    {
        self.copy_constructor = Some(Box::new(move |source: &dyn Structural| {
            source
                .as_any()
                .downcast_ref::<T>()
                .map(|source| Box::new(ctor(source)) as Box<dyn Structural>)
        }));
    }

    fn finish(self, id: TypeId, name: &'static str) -> TypeInfo {
        TypeInfo {
            name,
            id,
            members: self.members,
            simple: self.simple,
            enumerable: self.enumerable,
            constructor: self.constructor,
            copy_constructor: self.copy_constructor,
        }
    }
}

static DESCRIPTORS: Lazy<RwLock<HashMap<TypeId, &'static TypeInfo>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Fetch the cached descriptor for `T`, building it on first access.
///
/// Descriptors are built at most once per winning thread and shared
/// read-only for the lifetime of the process. When two threads race the
/// first registration, both builds succeed but the first insert wins for
/// every caller; the loser leaks one small duplicate allocation.
pub fn descriptor_of<T: Structural>(describe: impl FnOnce(&mut TypeBuilder<T>)) -> &'static TypeInfo {
    let id = TypeId::of::<T>();
    if let Some(info) = DESCRIPTORS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .copied()
    {
        return info;
    }

    let mut builder = TypeBuilder::new();
    describe(&mut builder);
    let built: &'static TypeInfo =
        Box::leak(Box::new(builder.finish(id, std::any::type_name::<T>())));

    let mut map = DESCRIPTORS.write().unwrap_or_else(PoisonError::into_inner);
    match map.entry(id) {
        Entry::Occupied(existing) => *existing.get(),
        Entry::Vacant(slot) => {
            debug!(
                "registered descriptor for `{}` ({} members)",
                built.name(),
                built.all_members().len()
            );
            slot.insert(built);
            built
        }
    }
}

/// Number of types registered so far.
pub fn registered_types() -> usize {
    DESCRIPTORS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .len()
}
