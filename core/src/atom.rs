//! Reactive cells over a state value
//!
//! An [`AtomGraph`] holds two kinds of nodes:
//!
//! - **source atoms** select a value out of the state (`Fn(&S) -> T`)
//! - **derived atoms** compute a value from other atoms through a [`Get`]
//!   context (`Fn(&Get<S>) -> T`)
//!
//! Every atom a derived computation reads through [`Get`] is recorded as one
//! of its inputs, and the record is refreshed on every evaluation, so
//! conditional reads are tracked correctly. A node can only read atoms that
//! were registered before it, which makes registration order a topological
//! order of the dependency graph.
//!
//! [`AtomGraph::recompute`] runs in two phases. First every source is
//! re-selected and every derived atom whose inputs changed is re-evaluated,
//! leaves first. Then all changed values are published to observers at once,
//! so no observer can see a new value next to a stale one.
//!
//! ```
//! use reactive_atoms_core::AtomGraph;
//!
//! #[derive(Default)]
//! struct State {
//!     items: Vec<u32>,
//! }
//!
//! let mut state = State::default();
//! let mut graph = AtomGraph::new();
//!
//! let items = graph.source("items", &state, |s: &State| s.items.clone());
//! let total = graph.derive("total", move |get| get.with(&items, |items| items.iter().sum::<u32>()));
//! let observer = total.subscribe();
//!
//! state.items.extend([1, 2, 3]);
//! let changed = graph.recompute(&state);
//!
//! assert_eq!(changed, vec!["items", "total"]);
//! assert_eq!(total.get(), 6);
//! assert!(observer.has_changed().unwrap_or(false));
//! ```

use std::any::Any;
use std::cell::RefCell;
use tokio::sync::watch;

type Value = Box<dyn Any + Send + Sync>;
type SelectFn<S> = Box<dyn Fn(&S) -> Value + Send + Sync>;
type ComputeFn<S> = Box<dyn for<'a> Fn(&Get<'a, S>) -> Value + Send + Sync>;
type PublishFn = Box<dyn Fn(&dyn Any) + Send + Sync>;

enum Kind<S> {
    Source(SelectFn<S>),
    Derived(ComputeFn<S>),
}

struct Node<S> {
    name: &'static str,
    kind: Kind<S>,
    value: Value,
    /// Indices of upstream nodes read during the last evaluation
    inputs: Vec<usize>,
    same: fn(&dyn Any, &dyn Any) -> bool,
    publish: PublishFn,
}

/// Handle to a single atom
///
/// The handle reads the last *published* value: readers never observe a
/// value that is still being computed. Handles are cheap to clone.
pub struct Atom<T> {
    id: usize,
    name: &'static str,
    rx: watch::Receiver<T>,
}

impl<T> Clone for Atom<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name,
            rx: self.rx.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Atom<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Atom")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<T> Atom<T> {
    /// Name the atom was registered under
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Borrow the current value for the duration of `f`
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.rx.borrow())
    }

    /// Observe future changes of this atom
    ///
    /// The returned receiver only reports values published after this call.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        let mut rx = self.rx.clone();
        let _ = rx.borrow_and_update();
        rx
    }
}

impl<T: Clone> Atom<T> {
    /// Clone out the current value
    #[must_use]
    pub fn get(&self) -> T {
        self.rx.borrow().clone()
    }
}

/// Read context handed to derived computations
///
/// Every atom read through this context becomes an input of the atom being
/// computed.
pub struct Get<'a, S> {
    nodes: &'a [Node<S>],
    reads: RefCell<Vec<usize>>,
}

impl<'a, S> Get<'a, S> {
    const fn new(nodes: &'a [Node<S>]) -> Self {
        Self {
            nodes,
            reads: RefCell::new(Vec::new()),
        }
    }

    /// Clone out the value of `atom`, recording it as an input
    pub fn get<T: Clone + 'static>(&self, atom: &Atom<T>) -> T {
        self.with(atom, T::clone)
    }

    /// Borrow the value of `atom`, recording it as an input
    ///
    /// Atoms registered after the one being computed (or belonging to another
    /// graph) are read from their published value and are not tracked.
    pub fn with<T: 'static, R>(&self, atom: &Atom<T>, f: impl FnOnce(&T) -> R) -> R {
        match self
            .nodes
            .get(atom.id)
            .and_then(|node| node.value.downcast_ref::<T>())
        {
            Some(value) => {
                self.reads.borrow_mut().push(atom.id);
                f(value)
            },
            None => f(&atom.rx.borrow()),
        }
    }

    fn into_reads(self) -> Vec<usize> {
        let mut reads = self.reads.into_inner();
        reads.sort_unstable();
        reads.dedup();
        reads
    }
}

/// Dependency graph of source and derived atoms over a state `S`
pub struct AtomGraph<S> {
    nodes: Vec<Node<S>>,
}

impl<S> Default for AtomGraph<S> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<S> std::fmt::Debug for AtomGraph<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomGraph")
            .field("atoms", &self.names())
            .finish()
    }
}

impl<S> AtomGraph<S> {
    /// Create an empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered atoms
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no atom has been registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Atom names in registration (= evaluation) order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.nodes.iter().map(|node| node.name).collect()
    }

    /// Names of the atoms `name` read during its last evaluation
    ///
    /// Returns `None` when no atom is registered under `name`.
    #[must_use]
    pub fn inputs_of(&self, name: &str) -> Option<Vec<&'static str>> {
        let node = self.nodes.iter().find(|node| node.name == name)?;
        Some(
            node.inputs
                .iter()
                .filter_map(|&input| self.nodes.get(input).map(|upstream| upstream.name))
                .collect(),
        )
    }
}

impl<S: 'static> AtomGraph<S> {
    /// Register a source atom selecting a value out of the state
    pub fn source<T, F>(&mut self, name: &'static str, state: &S, select: F) -> Atom<T>
    where
        T: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        let initial = select(state);
        let kind = Kind::Source(Box::new(move |state: &S| -> Value { Box::new(select(state)) }));
        self.push(name, kind, initial, Vec::new())
    }

    /// Register a derived atom computed from previously registered atoms
    pub fn derive<T, F>(&mut self, name: &'static str, compute: F) -> Atom<T>
    where
        T: Clone + PartialEq + Send + Sync + 'static,
        F: for<'a> Fn(&Get<'a, S>) -> T + Send + Sync + 'static,
    {
        let get = Get::new(&self.nodes);
        let initial = compute(&get);
        let inputs = get.into_reads();

        let kind = Kind::Derived(Box::new(move |get: &Get<'_, S>| -> Value {
            Box::new(compute(get))
        }));
        self.push(name, kind, initial, inputs)
    }

    fn push<T>(&mut self, name: &'static str, kind: Kind<S>, initial: T, inputs: Vec<usize>) -> Atom<T>
    where
        T: Clone + PartialEq + Send + Sync + 'static,
    {
        let (tx, rx) = watch::channel(initial.clone());
        let id = self.nodes.len();

        self.nodes.push(Node {
            name,
            kind,
            value: Box::new(initial),
            inputs,
            same: same_value::<T>,
            publish: Box::new(move |value: &dyn Any| {
                if let Some(value) = value.downcast_ref::<T>() {
                    tx.send_replace(value.clone());
                }
            }),
        });

        Atom { id, name, rx }
    }

    /// Bring every atom up to date with `state` and notify observers
    ///
    /// Returns the names of the atoms whose value changed, in evaluation order.
    pub fn recompute(&mut self, state: &S) -> Vec<&'static str> {
        let mut changed = vec![false; self.nodes.len()];

        for index in 0..self.nodes.len() {
            let (upstream, rest) = self.nodes.split_at_mut(index);
            let Some(node) = rest.first_mut() else {
                break;
            };

            let next = match &node.kind {
                Kind::Source(select) => select(state),
                Kind::Derived(compute) => {
                    if !node.inputs.iter().any(|&input| changed[input]) {
                        continue;
                    }
                    let get = Get::new(upstream);
                    let next = compute(&get);
                    node.inputs = get.into_reads();
                    next
                },
            };

            if !(node.same)(&*node.value, &*next) {
                node.value = next;
                changed[index] = true;
            }
        }

        // Publish only once the whole pass is consistent
        let mut names = Vec::new();
        for (node, _) in self.nodes.iter().zip(&changed).filter(|(_, changed)| **changed) {
            (node.publish)(&*node.value);
            names.push(node.name);
        }
        names
    }
}

fn same_value<T: PartialEq + 'static>(a: &dyn Any, b: &dyn Any) -> bool {
    matches!(
        (a.downcast_ref::<T>(), b.downcast_ref::<T>()),
        (Some(a), Some(b)) if a == b
    )
}
