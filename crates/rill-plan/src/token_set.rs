//! Growable bitset of [`TokenId`]s.
//!
//! Trailing zero words are trimmed after every mutation so equality and
//! hashing only look at members.

use serde::{Serialize, Serializer};

use crate::TokenId;

#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct TokenSet {
    words: Vec<u64>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(token: TokenId) -> Self {
        let mut set = Self::new();
        set.insert(token);
        set
    }

    pub fn insert(&mut self, token: TokenId) -> bool {
        let (word, bit) = locate(token);
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        let fresh = self.words[word] & bit == 0;
        self.words[word] |= bit;
        fresh
    }

    pub fn remove(&mut self, token: TokenId) -> bool {
        let (word, bit) = locate(token);
        let Some(w) = self.words.get_mut(word) else {
            return false;
        };
        let present = *w & bit != 0;
        *w &= !bit;
        self.trim();
        present
    }

    #[inline]
    pub fn contains(&self, token: TokenId) -> bool {
        let (word, bit) = locate(token);
        self.words.get(word).is_some_and(|w| w & bit != 0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn union_with(&mut self, other: &TokenSet) {
        if self.words.len() < other.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= b;
        }
    }

    pub fn subtract(&mut self, other: &TokenSet) {
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= !b;
        }
        self.trim();
    }

    pub fn union(&self, other: &TokenSet) -> TokenSet {
        let mut out = self.clone();
        out.union_with(other);
        out
    }

    pub fn difference(&self, other: &TokenSet) -> TokenSet {
        let mut out = self.clone();
        out.subtract(other);
        out
    }

    pub fn intersection(&self, other: &TokenSet) -> TokenSet {
        let mut out = TokenSet {
            words: self
                .words
                .iter()
                .zip(&other.words)
                .map(|(a, b)| a & b)
                .collect(),
        };
        out.trim();
        out
    }

    pub fn is_disjoint(&self, other: &TokenSet) -> bool {
        self.words.iter().zip(&other.words).all(|(a, b)| a & b == 0)
    }

    pub fn is_subset(&self, other: &TokenSet) -> bool {
        self.words
            .iter()
            .enumerate()
            .all(|(i, w)| w & !other.words.get(i).copied().unwrap_or(0) == 0)
    }

    /// Members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = TokenId> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            (0..64u32)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| TokenId::new(i * 64 + bit as usize))
        })
    }

    /// Little-endian byte mask covering `token_count` tokens, as stored in
    /// emitted expected-mask tables.
    pub fn to_bytes(&self, token_count: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; token_count.div_ceil(8)];
        for token in self.iter() {
            let i = token.index();
            if let Some(byte) = bytes.get_mut(i / 8) {
                *byte |= 1 << (i % 8);
            }
        }
        bytes
    }

    fn trim(&mut self) {
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
    }
}

#[inline]
fn locate(token: TokenId) -> (usize, u64) {
    let i = token.index();
    (i / 64, 1u64 << (i % 64))
}

impl FromIterator<TokenId> for TokenSet {
    fn from_iter<I: IntoIterator<Item = TokenId>>(iter: I) -> Self {
        let mut set = TokenSet::new();
        for token in iter {
            set.insert(token);
        }
        set
    }
}

impl Extend<TokenId> for TokenSet {
    fn extend<I: IntoIterator<Item = TokenId>>(&mut self, iter: I) {
        for token in iter {
            self.insert(token);
        }
    }
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter().map(|t| t.0)).finish()
    }
}

impl Serialize for TokenSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}
