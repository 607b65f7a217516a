//! Augment chains
//!
//! Calling an augmented member runs the oldest level first. Each level is
//! invoked as `level(inner, ...args)`; calling `inner` hands control to the
//! next more-derived level, and returns `Undefined` past the last one.
//!
//! Every call of an augmented member opens its own chain on the receiver's
//! stack. The chain marker sits below that chain's pending levels, and
//! markers for running code sit above them:
//!
//! ```text
//! m(L4 > L3 > L2 > L1) called, L1 running, L1 calls this.n():
//!
//!   Chain(m) Pending(m,L4) Pending(m,L3) Pending(m,L2) Running(m)
//!   Chain(n) Running(n)                               <- top
//! ```
//!
//! `inner` of a chain only takes that chain's pending levels, so `n`'s
//! levels never see `L2`. Every push is undone by a drop guard, so the stack
//! returns to its pre-call state on success, error, and re-entrant calls
//! alike.

use crate::error::{Error, Result};
use crate::function::Function;
use crate::object::Object;
use crate::value::Value;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CHAIN: AtomicU64 = AtomicU64::new(1);

/// Entry of an object's augment stack
#[derive(Debug, Clone)]
pub(crate) enum StackEntry {
    /// Start of one augmented call
    Chain(u64),

    /// Level of a chain waiting for `inner`
    Pending(u64, Function),

    /// Code of a chain currently running; `base` marks a plain base implementation
    Running { chain: u64, base: bool },
}

/// One augment level installed over an older implementation
pub(crate) struct Link {
    member: String,
    existing: Function,
    level: Function,
    limit: usize,
}

impl Link {
    pub(crate) fn member(&self) -> &str {
        &self.member
    }
}

/// Build the function installing `level` inside `existing`
pub(crate) fn wrap(member: &str, existing: Function, level: Function, limit: usize) -> Function {
    Function::augmented(Link {
        member: member.to_string(),
        existing,
        level,
        limit,
    })
}

/// Levels waiting for `inner`, over all chains
pub(crate) fn pending_levels(stack: &[StackEntry]) -> usize {
    stack
        .iter()
        .filter(|entry| matches!(entry, StackEntry::Pending(..)))
        .count()
}

enum Start {
    Head(Function),
    Base(Function),
}

/// Call an augmented member: open a chain and run its oldest code
pub(crate) fn run(link: &Link, this: &Value, args: &[Value]) -> Result<Value> {
    let receiver = receiver(this, &link.member)?;
    let (mut levels, base) = collect(link);

    let start = match base {
        Some(base) => Start::Base(base),
        // nothing older to run: the oldest level heads the chain
        None => match levels.pop() {
            Some(head) => Start::Head(head),
            None => return Ok(Value::Undefined),
        },
    };

    let chain = NEXT_CHAIN.fetch_add(1, Ordering::Relaxed);
    let _frame = Frame::open(receiver, chain, levels, &link.member, link.limit)?;
    match start {
        Start::Head(head) => invoke_level(receiver, chain, &head, this, args),
        Start::Base(base) => {
            let _running = Running::enter(receiver, chain, true);
            base.call(this, args)
        }
    }
}

/// Root member `inner`: continue the chain whose plain base is running
///
/// # Errors
/// Whatever the level returns
pub(crate) fn call_inner(this: &Value, args: &[Value]) -> Result<Value> {
    let receiver = receiver(this, "inner")?;
    let running_base = receiver.with_augment_stack(|stack| match stack.last() {
        Some(StackEntry::Running { chain, base: true }) => Some(*chain),
        _ => None,
    });
    match running_base {
        Some(chain) => resume(receiver, chain, this, args),
        None => Ok(Value::Undefined),
    }
}

/// Levels from most derived to oldest, plus the plain implementation below them
fn collect(link: &Link) -> (Vec<Function>, Option<Function>) {
    let mut levels = vec![link.level.clone()];
    let mut next = link.existing.resolve();
    while let Some(current) = next {
        if let Some(older) = current.augment_link() {
            levels.push(older.level.clone());
            next = older.existing.resolve();
            continue;
        }
        return (levels, Some(current));
    }
    (levels, None)
}

/// Run the next pending level of `chain`, or return `Undefined`
fn resume(receiver: &Object, chain: u64, this: &Value, args: &[Value]) -> Result<Value> {
    let Some((index, next)) = receiver.with_augment_stack(|stack| take_pending(stack, chain)) else {
        return Ok(Value::Undefined);
    };
    let _restore = Restore {
        receiver,
        index,
        entry: Some(StackEntry::Pending(chain, next.clone())),
    };
    invoke_level(receiver, chain, &next, this, args)
}

fn take_pending(stack: &mut Vec<StackEntry>, chain: u64) -> Option<(usize, Function)> {
    let index = stack.iter().rposition(|entry| match entry {
        StackEntry::Pending(id, _) | StackEntry::Chain(id) => *id == chain,
        StackEntry::Running { .. } => false,
    })?;
    // reaching the chain marker first means nothing is left for this chain
    if !matches!(stack.get(index), Some(StackEntry::Pending(..))) {
        return None;
    }
    match stack.remove(index) {
        StackEntry::Pending(_, level) => Some((index, level)),
        _ => None,
    }
}

fn invoke_level(
    receiver: &Object,
    chain: u64,
    level: &Function,
    this: &Value,
    args: &[Value],
) -> Result<Value> {
    let _running = Running::enter(receiver, chain, false);

    let bound = this.clone();
    let object = receiver.clone();
    let inner = Function::new("inner", move |_, args| resume(&object, chain, &bound, args));

    let mut call_args = Vec::with_capacity(args.len() + 1);
    call_args.push(Value::Function(inner));
    call_args.extend_from_slice(args);
    level.call(this, &call_args)
}

fn receiver<'a>(this: &'a Value, member: &str) -> Result<&'a Object> {
    this.as_object().ok_or_else(|| {
        Error::InvalidArgument(format!(
            "augmented `{member}` called on {}",
            this.type_name()
        ))
    })
}

/// Chain marker plus pending levels; removed when the call finishes
struct Frame<'a> {
    receiver: &'a Object,
    chain: u64,
}

impl<'a> Frame<'a> {
    fn open(
        receiver: &'a Object,
        chain: u64,
        levels: Vec<Function>,
        member: &str,
        limit: usize,
    ) -> Result<Self> {
        let opened = receiver.with_augment_stack(|stack| {
            let used = stack
                .iter()
                .filter(|entry| !matches!(entry, StackEntry::Running { .. }))
                .count();
            if used + 1 + levels.len() > limit {
                return false;
            }
            stack.push(StackEntry::Chain(chain));
            stack.extend(levels.into_iter().map(|level| StackEntry::Pending(chain, level)));
            true
        });
        if !opened {
            tracing::warn!(member, limit, "augment depth exceeded");
            return Err(Error::AugmentDepthExceeded {
                member: member.to_string(),
                limit,
            });
        }
        Ok(Self { receiver, chain })
    }
}

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        let chain = self.chain;
        self.receiver.with_augment_stack(|stack| {
            let start = stack
                .iter()
                .rposition(|entry| matches!(entry, StackEntry::Chain(id) if *id == chain));
            if let Some(start) = start {
                stack.truncate(start);
            }
        });
    }
}

/// Marks code of a chain as running until dropped
struct Running<'a> {
    receiver: &'a Object,
    chain: u64,
}

impl<'a> Running<'a> {
    fn enter(receiver: &'a Object, chain: u64, base: bool) -> Self {
        receiver.with_augment_stack(|stack| stack.push(StackEntry::Running { chain, base }));
        Self { receiver, chain }
    }
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        let chain = self.chain;
        self.receiver.with_augment_stack(|stack| {
            let found = stack.iter().rposition(
                |entry| matches!(entry, StackEntry::Running { chain: id, .. } if *id == chain),
            );
            if let Some(index) = found {
                stack.remove(index);
            }
        });
    }
}

/// Puts a taken level back where it was when `inner` returns
struct Restore<'a> {
    receiver: &'a Object,
    index: usize,
    entry: Option<StackEntry>,
}

impl Drop for Restore<'_> {
    fn drop(&mut self) {
        if let Some(entry) = self.entry.take() {
            let index = self.index;
            self.receiver.with_augment_stack(|stack| {
                stack.insert(index.min(stack.len()), entry);
            });
        }
    }
}
