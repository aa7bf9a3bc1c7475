use alloy::primitives::{Address, Bytes, U256};
use serde::Serialize;
use std::collections::HashSet;

/// A single encoded call with its destination.
///
/// Two descriptors with identical fields are the same call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallData {
    pub to: Address,
    pub call_data: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_data: Option<Bytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_data: Option<Bytes>,
}

impl CallData {
    pub fn new(to: Address, call_data: impl Into<Bytes>) -> Self {
        Self {
            to,
            call_data: call_data.into(),
            init_data: None,
            view_data: None,
        }
    }

    pub fn with_init_data(mut self, init_data: impl Into<Bytes>) -> Self {
        self.init_data = Some(init_data.into());
        self
    }

    pub fn with_view_data(mut self, view_data: impl Into<Bytes>) -> Self {
        self.view_data = Some(view_data.into());
        self
    }
}

/// Insertion-ordered set of calls. Re-inserting an equal call is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallDataSet {
    calls: Vec<CallData>,
    seen: HashSet<CallData>,
}

impl CallDataSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when an equal call is already present.
    pub fn insert(&mut self, call: CallData) -> bool {
        if !self.seen.insert(call.clone()) {
            return false;
        }
        self.calls.push(call);
        true
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CallData> {
        self.calls.iter()
    }

    pub fn into_vec(self) -> Vec<CallData> {
        self.calls
    }
}

impl Extend<CallData> for CallDataSet {
    fn extend<I: IntoIterator<Item = CallData>>(&mut self, iter: I) {
        for call in iter {
            self.insert(call);
        }
    }
}

impl FromIterator<CallData> for CallDataSet {
    fn from_iter<I: IntoIterator<Item = CallData>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for CallDataSet {
    type Item = CallData;
    type IntoIter = std::vec::IntoIter<CallData>;

    fn into_iter(self) -> Self::IntoIter {
        self.calls.into_iter()
    }
}

impl<'a> IntoIterator for &'a CallDataSet {
    type Item = &'a CallData;
    type IntoIter = std::slice::Iter<'a, CallData>;

    fn into_iter(self) -> Self::IntoIter {
        self.calls.iter()
    }
}

/// Calls and native value produced by one builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildResult {
    pub call_data: CallDataSet,
    pub value: U256,
}

impl BuildResult {
    pub fn empty() -> Self {
        Self::default()
    }
}
