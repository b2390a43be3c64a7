use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Type-map storage for singleton resources, with string-tag aliases.
///
/// At most one instance is stored per type. Tags only name an entry; removing a
/// tag never touches the instance it pointed at.
pub struct Resources {
    map: HashMap<TypeId, Box<dyn Any>>,
    tags: HashMap<String, TypeId>,
}

impl Resources {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            tags: HashMap::new(),
        }
    }

    /// Register a resource, optionally aliased under `tag`. The first
    /// registration of a type wins; later ones return `false` and are dropped.
    pub fn register<T: 'static>(&mut self, value: T, tag: Option<&str>) -> bool {
        let id = TypeId::of::<T>();
        if self.map.contains_key(&id) {
            return false;
        }
        self.map.insert(id, Box::new(value));
        if let Some(tag) = tag {
            self.tags.insert(tag.to_owned(), id);
        }
        true
    }

    /// Get an immutable reference to a resource.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|b| b.downcast_ref())
    }

    /// Get a mutable reference to a resource.
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.map
            .get_mut(&TypeId::of::<T>())
            .and_then(|b| b.downcast_mut())
    }

    /// Look a resource up by tag without knowing its type.
    pub fn get_by_tag(&self, tag: &str) -> Option<&dyn Any> {
        let id = self.tags.get(tag)?;
        self.map.get(id).map(|b| b.as_ref())
    }

    /// Look a resource up by tag, downcast to `T`.
    pub fn get_tagged<T: 'static>(&self, tag: &str) -> Option<&T> {
        self.get_by_tag(tag)?.downcast_ref()
    }

    /// Alias an already registered resource under `tag`.
    pub fn tag<T: 'static>(&mut self, tag: &str) -> bool {
        let id = TypeId::of::<T>();
        if !self.map.contains_key(&id) {
            return false;
        }
        self.tags.insert(tag.to_owned(), id);
        true
    }

    /// Remove only the alias. Returns `true` if the tag existed.
    pub fn untag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag).is_some()
    }

    /// Remove a resource and every tag aliasing it, returning it if it existed.
    pub fn unregister<T: 'static>(&mut self) -> Option<T> {
        let id = TypeId::of::<T>();
        let value = self.map.remove(&id)?;
        self.tags.retain(|_, tagged| *tagged != id);
        value.downcast().ok().map(|b| *b)
    }

    /// Check whether a resource of this type exists.
    pub fn contains<T: 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for Resources {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_get() {
        let mut res = Resources::new();
        res.register(42u32, None);
        res.register("hello".to_string(), None);
        assert_eq!(res.get::<u32>(), Some(&42));
        assert_eq!(res.get::<String>(), Some(&"hello".to_string()));
    }

    #[test]
    fn first_registration_wins() {
        let mut res = Resources::new();
        assert!(res.register(1u32, None));
        assert!(!res.register(2u32, Some("two")));
        assert_eq!(res.get::<u32>(), Some(&1));
        assert!(res.get_by_tag("two").is_none());
    }

    #[test]
    fn mutate() {
        let mut res = Resources::new();
        res.register(vec![1, 2, 3], None);
        res.get_mut::<Vec<i32>>().unwrap().push(4);
        assert_eq!(res.get::<Vec<i32>>().unwrap().len(), 4);
    }

    #[test]
    fn tag_lifecycle() {
        let mut res = Resources::new();
        res.register(7u64, Some("Seven"));
        assert_eq!(res.get_tagged::<u64>("Seven"), Some(&7));
        assert!(res.get_tagged::<u32>("Seven").is_none());

        assert!(res.untag("Seven"));
        assert!(res.get_by_tag("Seven").is_none());
        assert_eq!(res.get::<u64>(), Some(&7));

        assert!(res.tag::<u64>("Again"));
        assert!(res.tag::<u64>("Other"));
        assert_eq!(res.unregister::<u64>(), Some(7));
        assert!(res.get_by_tag("Again").is_none());
        assert!(res.get_by_tag("Other").is_none());
    }

    #[test]
    fn tag_requires_registered_type() {
        let mut res = Resources::new();
        assert!(!res.tag::<u8>("Missing"));
        assert!(!res.untag("Missing"));
    }
}
