use std::ops::Range;

/// Index of a backing store inside a [`StoreArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreId(pub(crate) u8);

/// Named byte array backing one or more page-table windows
pub struct BackingStore {
    name: &'static str,
    data: Box<[u8]>,
    read_only: bool,
}

impl BackingStore {
    pub fn new(name: &'static str, size: usize, read_only: bool) -> Self {
        Self {
            name,
            data: vec![0u8; size].into_boxed_slice(),
            read_only,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    #[inline(always)]
    pub(crate) fn slice(&self, range: Range<usize>) -> Option<&[u8]> {
        self.data.get(range)
    }

    #[inline(always)]
    pub(crate) fn slice_mut(&mut self, range: Range<usize>) -> Option<&mut [u8]> {
        self.data.get_mut(range)
    }

    pub fn clear(&mut self) {
        self.data.iter_mut().for_each(|byte| *byte = 0);
    }
}

/// Owns every backing store; page tables refer to stores by [`StoreId`]
#[derive(Default)]
pub struct StoreArena {
    stores: Vec<BackingStore>,
}

impl StoreArena {
    pub fn new() -> Self {
        Self { stores: Vec::new() }
    }

    pub fn allocate(&mut self, store: BackingStore) -> StoreId {
        debug_assert!(self.stores.len() < u8::MAX as usize);
        let id = StoreId(self.stores.len() as u8);
        self.stores.push(store);
        id
    }

    #[inline(always)]
    pub fn get(&self, id: StoreId) -> &BackingStore {
        &self.stores[id.0 as usize]
    }

    #[inline(always)]
    pub fn get_mut(&mut self, id: StoreId) -> &mut BackingStore {
        &mut self.stores[id.0 as usize]
    }

    pub fn find(&self, name: &str) -> Option<StoreId> {
        self.stores
            .iter()
            .position(|store| store.name == name)
            .map(|idx| StoreId(idx as u8))
    }
}

#[cfg(test)]
mod store_tests {
    use super::*;

    #[test]
    fn test_allocate_and_find() {
        let mut arena = StoreArena::new();
        let ram = arena.allocate(BackingStore::new("ram", 0x1000, false));
        let rom = arena.allocate(BackingStore::new("rom", 0x2000, true));

        assert_eq!(arena.find("ram"), Some(ram));
        assert_eq!(arena.find("rom"), Some(rom));
        assert_eq!(arena.find("vram"), None);
        assert_eq!(arena.get(rom).len(), 0x2000);
        assert!(arena.get(rom).is_read_only());
    }

    #[test]
    fn test_clear_zeroes_contents() {
        let mut store = BackingStore::new("ram", 0x10, false);
        store.bytes_mut()[3] = 0xAB;
        store.clear();
        assert!(store.bytes().iter().all(|&b| b == 0));
    }
}
