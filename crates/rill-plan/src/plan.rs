//! The plan handed to emitters and to the interpreter.

use serde::Serialize;

use crate::{FnId, RecoveryId, SlotId, SnippetId, StateId, Step, TokenId, TokenSet, TypeId};

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct TokenInfo {
    pub name: String,
    pub ty: Option<TypeId>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct TypeInfo {
    pub name: String,
    /// Target-language type, verbatim.
    pub spec: String,
    pub destructor: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct SlotInfo {
    /// `$$` for the output slot, otherwise the bind-tag.
    pub name: String,
    pub ty: Option<TypeId>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct SnippetInfo {
    pub code: String,
    pub bind: Option<String>,
    /// Runs on the recovery path and may examine the offending token.
    pub recovery: bool,
    /// 1-based source line of the snippet, for `#line` directives.
    pub line: u32,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct FnPlan {
    pub name: String,
    pub ty: Option<TypeId>,
    pub slots: Vec<SlotInfo>,
    pub counters: u16,
    pub states: Vec<Step>,
}

impl FnPlan {
    pub fn state(&self, id: StateId) -> &Step {
        &self.states[id.index()]
    }

    pub fn slot(&self, id: SlotId) -> &SlotInfo {
        &self.slots[id.index()]
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct RootEntry {
    pub name: String,
    pub function: FnId,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct RecoveryInfo {
    pub function: FnId,
    /// First state of the recovery path.
    pub handler: StateId,
    pub sentinel: TokenSet,
    /// Slots bound inside the recovered branches; released on unwind.
    pub scoped_slots: Vec<SlotId>,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize)]
pub struct ParserPlan {
    pub tokens: Vec<TokenInfo>,
    pub types: Vec<TypeInfo>,
    pub functions: Vec<FnPlan>,
    pub snippets: Vec<SnippetInfo>,
    pub roots: Vec<RootEntry>,
    pub recoveries: Vec<RecoveryInfo>,
    /// Token that ends the input; reaching it while resynchronizing is fatal.
    pub end_token: Option<TokenId>,
}

impl ParserPlan {
    pub fn function(&self, id: FnId) -> &FnPlan {
        &self.functions[id.index()]
    }

    pub fn snippet(&self, id: SnippetId) -> &SnippetInfo {
        &self.snippets[id.index()]
    }

    pub fn recovery(&self, id: RecoveryId) -> &RecoveryInfo {
        &self.recoveries[id.index()]
    }

    pub fn token_name(&self, id: TokenId) -> &str {
        self.tokens
            .get(id.index())
            .map_or("<unknown>", |t| t.name.as_str())
    }

    pub fn token_id(&self, name: &str) -> Option<TokenId> {
        self.tokens
            .iter()
            .position(|t| t.name == name)
            .map(TokenId::new)
    }

    pub fn root(&self, name: &str) -> Option<&RootEntry> {
        self.roots.iter().find(|r| r.name == name)
    }

    /// Names of the tokens in `set`, in id order.
    pub fn token_names(&self, set: &TokenSet) -> Vec<&str> {
        set.iter().map(|t| self.token_name(t)).collect()
    }

    /// Most slots any function needs; sizes emitted frames.
    pub fn max_slots(&self) -> usize {
        self.functions.iter().map(|f| f.slots.len()).max().unwrap_or(0)
    }

    pub fn max_counters(&self) -> usize {
        self.functions
            .iter()
            .map(|f| f.counters as usize)
            .max()
            .unwrap_or(0)
    }
}
