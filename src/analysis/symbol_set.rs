use std::fmt::{self, Debug, Formatter};
use std::iter::Enumerate;
use std::slice;

type BitBlock = u64;

const BLOCK_NBITS: usize = std::mem::size_of::<BitBlock>() * 8;

/// Index of a terminal symbol in the grammar's `SymbolTable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub u32);

/// A set of terminal symbols, sized for one grammar's alphabet.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct SymbolSet {
  slice: Box<[BitBlock]>,
}

impl SymbolSet {
  pub fn new(num_symbols: usize) -> Self {
    let len = (num_symbols + BLOCK_NBITS - 1) / BLOCK_NBITS;
    Self {
      slice: vec![0; len].into_boxed_slice(),
    }
  }

  pub fn clear(&mut self) {
    for x in self.slice.iter_mut() {
      *x = 0;
    }
  }

  /// Returns whether the symbol was newly added.
  pub fn insert(&mut self, id: SymbolId) -> bool {
    let (block, mask) = locate(id);
    let old = self.slice[block];
    self.slice[block] |= mask;
    old != self.slice[block]
  }

  pub fn contains(&self, id: SymbolId) -> bool {
    let (block, mask) = locate(id);
    self.slice.get(block).map_or(false, |&x| x & mask != 0)
  }

  /// Returns whether the set has changed.
  pub fn union_with(&mut self, other: &SymbolSet) -> bool {
    debug_assert_eq!(self.slice.len(), other.slice.len());
    let mut changed = false;
    for (x, &y) in self.slice.iter_mut().zip(other.slice.iter()) {
      let old = *x;
      *x |= y;
      changed |= old != *x;
    }
    changed
  }

  pub fn is_superset(&self, other: &SymbolSet) -> bool {
    self.slice.iter()
      .zip(other.slice.iter())
      .all(|(&x, &y)| x & y == y)
  }

  pub fn len(&self) -> usize {
    self.slice.iter().map(|x| x.count_ones() as usize).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.slice.iter().all(|&x| x == 0)
  }

  pub fn iter(&self) -> Iter<'_> {
    Iter {
      blocks: self.slice.iter().enumerate(),
      block: 0,
      rest: 0,
    }
  }
}

fn locate(id: SymbolId) -> (usize, BitBlock) {
  let bit = id.0 as usize;
  (bit / BLOCK_NBITS, 1 << (bit % BLOCK_NBITS))
}

fn id_at(block: usize, bit: u32) -> SymbolId {
  SymbolId((block * BLOCK_NBITS) as u32 + bit)
}

/// Symbols of a set in increasing order.
pub struct Iter<'a> {
  blocks: Enumerate<slice::Iter<'a, BitBlock>>,
  block: usize,
  /// bits of `block` not yet yielded
  rest: BitBlock,
}

impl<'a> Iterator for Iter<'a> {
  type Item = SymbolId;

  fn next(&mut self) -> Option<SymbolId> {
    while self.rest == 0 {
      let (block, &bits) = self.blocks.next()?;
      self.block = block;
      self.rest = bits;
    }
    let bit = self.rest.trailing_zeros();
    self.rest &= self.rest - 1;
    Some(id_at(self.block, bit))
  }
}

impl<'a> IntoIterator for &'a SymbolSet {
  type Item = SymbolId;
  type IntoIter = Iter<'a>;

  fn into_iter(self) -> Iter<'a> {
    self.iter()
  }
}

impl Debug for SymbolSet {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    f.debug_set().entries(self.iter().map(|id| id.0)).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn ids(set: &SymbolSet) -> Vec<u32> {
    set.iter().map(|id| id.0).collect()
  }

  #[test]
  fn insert() {
    let mut set = SymbolSet::new(15);

    assert!(set.insert(SymbolId(7)));
    assert!(set.insert(SymbolId(3)));
    assert!(!set.insert(SymbolId(7)));
    assert!(set.insert(SymbolId(14)));

    assert_eq!(ids(&set), vec![3, 7, 14]);
    assert_eq!(set.len(), 3);
    assert!(set.contains(SymbolId(14)));
    assert!(!set.contains(SymbolId(4)));
  }

  #[test]
  fn across_blocks() {
    let mut set = SymbolSet::new(130);

    set.insert(SymbolId(63));
    set.insert(SymbolId(64));
    set.insert(SymbolId(129));

    assert_eq!(ids(&set), vec![63, 64, 129]);
    assert_eq!(format!("{:?}", set), "{63, 64, 129}");
  }

  #[test]
  fn union_reports_growth() {
    let mut a = SymbolSet::new(70);
    let mut b = SymbolSet::new(70);
    a.insert(SymbolId(1));
    b.insert(SymbolId(1));
    b.insert(SymbolId(65));

    assert!(!a.union_with(&a.clone()));
    assert!(!b.is_superset(&{
      let mut c = b.clone();
      c.insert(SymbolId(2));
      c
    }));
    assert!(a.union_with(&b));
    assert!(!a.union_with(&b));
    assert!(a.is_superset(&b));
    assert_eq!(ids(&a), vec![1, 65]);

    a.clear();
    assert!(a.is_empty());
  }

  #[test]
  fn dense_iteration() {
    let mut set = SymbolSet::new(130);
    for i in (0..130).rev() {
      set.insert(SymbolId(i));
    }

    assert_eq!(ids(&set), (0..130).collect::<Vec<_>>());
    assert_eq!((&set).into_iter().count(), set.len());
  }

  #[test]
  fn empty_default() {
    let set = SymbolSet::default();

    assert!(set.is_empty());
    assert!(!set.contains(SymbolId(0)));
    assert_eq!(set.iter().next(), None);
  }
}
