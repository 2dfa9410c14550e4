//! # Interval Tree Clocks
//!
//! Implements Interval Tree Clocks as described in
//! <http://gsd.di.uminho.pt/members/cbm/ps/itc2008.pdf>.
//!
//! # Usage:
//!
//! ```
//! use itc::*;
//!
//! let s = Stamp::seed();
//!
//! let (s1, s2) = s.fork();
//! let s1prime = s1.event();
//! let s2prime = s2.event();
//! let s3 = s2prime.join(&s1).unwrap();
//!
//! assert!(s.leq(&s1));
//! assert!(s1.leq(&s1prime));
//! assert!(!s1prime.leq(&s2prime));
//! assert!(s2prime.leq(&s3));
//! ```
//!
//! This crate implements the kernel verbs (fork, event, join, peek), the
//! derived composites (send, receive, sync), the `leq` partial order and
//! its derived relations (`equiv`, `concurrent`, `dominates`), plus a
//! canonical textual notation and a compact binary codec for stamps.
//!
//! The kernel is pure: every operation returns a new value and never
//! mutates its inputs. `fork`, `peek`, `event`, `leq` and the derived
//! relations never fail on well-formed stamps; `join` (and anything built
//! on it: `receive`, `sync`) can fail with [`Error::OverlappingIds`] if the
//! two stamps' identities were never actually disjoint.

use std::borrow::Cow;
use std::cmp;

pub mod binary;
pub mod cost;
pub mod error;
pub mod text;

#[cfg(feature = "serde")]
mod serde;

pub use cost::Cost;
pub use error::{Error, Result};

#[cfg(feature = "serde")]
use ::serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum IdTree {
    Leaf { i: bool },
    Node { left: Box<IdTree>, right: Box<IdTree> },
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum EventTree {
    Leaf { n: u32 },
    Node {
        n: u32,
        left: Box<EventTree>,
        right: Box<EventTree>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stamp {
    i: IdTree,
    e: EventTree,
}

impl IdTree {
    pub fn leaf(i: bool) -> IdTree {
        IdTree::Leaf { i: i }
    }

    pub fn zero() -> IdTree {
        IdTree::Leaf { i: false }
    }

    pub fn one() -> IdTree {
        IdTree::Leaf { i: true }
    }

    pub fn node(left: Box<IdTree>, right: Box<IdTree>) -> IdTree {
        IdTree::Node {
            left: left,
            right: right,
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, IdTree::Leaf { i: false })
    }
}

impl EventTree {
    pub fn zero() -> EventTree {
        EventTree::leaf(0)
    }

    pub fn leaf(n: u32) -> EventTree {
        EventTree::Leaf { n: n }
    }

    pub fn node(n: u32, left: Box<EventTree>, right: Box<EventTree>) -> EventTree {
        EventTree::Node {
            n: n,
            left: left,
            right: right,
        }
    }

    pub fn n(&self) -> u32 {
        match self {
            &EventTree::Leaf { n } => n,
            &EventTree::Node { n, .. } => n,
        }
    }

    pub fn lift(self, m: u32) -> EventTree {
        match self {
            EventTree::Leaf { n } => EventTree::leaf(n + m),
            EventTree::Node { n, left, right } => EventTree::node(n + m, left, right),
        }
    }

    pub fn sink(self, m: u32) -> EventTree {
        match self {
            EventTree::Leaf { n } => EventTree::leaf(n - m),
            EventTree::Node { n, left, right } => EventTree::node(n - m, left, right),
        }
    }

    pub fn join(&self, other: &EventTree) -> EventTree {
        match *self {
            EventTree::Leaf { n: n1 } => match *other {
                EventTree::Leaf { n: n2 } => EventTree::leaf(cmp::max(n1, n2)),
                EventTree::Node { .. } => {
                    let new_left = EventTree::node(
                        n1,
                        Box::new(EventTree::zero()),
                        Box::new(EventTree::zero()),
                    );
                    new_left.join(other)
                }
            },
            EventTree::Node {
                n: n1,
                left: ref left1,
                right: ref right1,
            } => match *other {
                EventTree::Leaf { n: n2 } => {
                    let new_right = EventTree::node(
                        n2,
                        Box::new(EventTree::zero()),
                        Box::new(EventTree::zero()),
                    );
                    self.join(&new_right)
                }
                EventTree::Node {
                    n: n2,
                    left: ref left2,
                    right: ref right2,
                } => {
                    if n1 > n2 {
                        other.join(self)
                    } else {
                        let new_left = left1.join(&left2.clone().lift(n2 - n1));
                        let new_right = right1.join(&right2.clone().lift(n2 - n1));
                        EventTree::node(n1, Box::new(new_left), Box::new(new_right)).norm()
                    }
                }
            },
        }
    }

    /// `leq(a, b) && leq(b, a)`: the two histories are identical.
    pub fn equiv(&self, other: &EventTree) -> bool {
        self.leq(other) && other.leq(self)
    }

    /// Neither history happened before the other.
    pub fn concurrent(&self, other: &EventTree) -> bool {
        !self.leq(other) && !other.leq(self)
    }

    /// `self` strictly happened after `other`.
    pub fn dominates(&self, other: &EventTree) -> bool {
        other.leq(self) && !self.leq(other)
    }
}

impl Stamp {
    pub fn seed() -> Stamp {
        Stamp::new(IdTree::one(), EventTree::zero())
    }

    pub fn new(i: IdTree, e: EventTree) -> Stamp {
        Stamp { i: i, e: e }
    }

    pub fn id_tree(&self) -> IdTree {
        self.i.clone()
    }
    pub fn event_tree(&self) -> EventTree {
        self.e.clone()
    }

    /// `leq(a, b) && leq(b, a)` on the underlying event trees.
    pub fn equiv(&self, other: &Stamp) -> bool {
        self.e.equiv(&other.e)
    }

    /// Neither stamp's history happened before the other's: a concurrent
    /// update was made without either side observing the other.
    pub fn concurrent(&self, other: &Stamp) -> bool {
        self.e.concurrent(&other.e)
    }

    /// `self`'s history strictly happened after `other`'s.
    pub fn dominates(&self, other: &Stamp) -> bool {
        self.e.dominates(&other.e)
    }

    pub fn fill<'a>(&'a self) -> Cow<'a, EventTree> {
        if self.i == IdTree::zero() {
            Cow::Borrowed(&self.e)
        } else if self.i == IdTree::one() {
            Cow::Owned(EventTree::leaf(self.e.max()))
        } else if let EventTree::Leaf { .. } = self.e {
            Cow::Borrowed(&self.e)
        } else {
            if let IdTree::Node {
                left: ref i_left,
                right: ref i_right,
            } = self.i
            {
                if let EventTree::Node {
                    n,
                    left: ref e_left,
                    right: ref e_right,
                } = self.e
                {
                    if i_left.as_ref() == &IdTree::one() {
                        let eprime_right =
                            Stamp::new(i_right.as_ref().clone(), e_right.as_ref().clone())
                                .fill()
                                .into_owned();
                        let new_left = EventTree::leaf(cmp::max(e_left.max(), eprime_right.min()));
                        Cow::Owned(
                            EventTree::node(n, Box::new(new_left), Box::new(eprime_right)).norm(),
                        )
                    } else if i_right.as_ref() == &IdTree::one() {
                        let eprime_left =
                            Stamp::new(i_left.as_ref().clone(), e_left.as_ref().clone())
                                .fill()
                                .into_owned();
                        let new_right = EventTree::leaf(cmp::max(e_right.max(), eprime_left.min()));
                        Cow::Owned(
                            EventTree::node(n, Box::new(eprime_left), Box::new(new_right)).norm(),
                        )
                    } else {
                        let new_left = Stamp::new(i_left.as_ref().clone(), e_left.as_ref().clone())
                            .fill()
                            .into_owned();
                        let new_right =
                            Stamp::new(i_right.as_ref().clone(), e_right.as_ref().clone())
                                .fill()
                                .into_owned();
                        Cow::Owned(
                            EventTree::node(n, Box::new(new_left), Box::new(new_right)).norm(),
                        )
                    }
                } else {
                    unreachable!()
                }
            } else {
                unreachable!()
            }
        }
    }

    // returns event tree and cost
    pub fn grow(&self) -> (EventTree, Cost) {
        match self.e {
            EventTree::Leaf { n } => {
                if self.i == IdTree::one() {
                    (EventTree::leaf(n + 1), Cost::zero())
                } else {
                    let new_e = EventTree::node(
                        n,
                        Box::new(EventTree::zero()),
                        Box::new(EventTree::zero()),
                    );
                    let (eprime, c) = Stamp::new(self.i.clone(), new_e).grow();
                    (eprime, c.shift())
                }
            }
            EventTree::Node {
                n,
                left: ref e_left,
                right: ref e_right,
            } => {
                if let IdTree::Node {
                    left: ref i_left,
                    right: ref i_right,
                } = self.i
                {
                    if **i_left == IdTree::zero() {
                        let (eprime_right, c_right) =
                            Stamp::new(i_right.as_ref().clone(), e_right.as_ref().clone()).grow();
                        (
                            EventTree::node(n, e_left.clone(), Box::new(eprime_right)),
                            c_right + 1,
                        )
                    } else if **i_right == IdTree::zero() {
                        let (eprime_left, c_left) =
                            Stamp::new(*i_left.clone(), *e_left.clone()).grow();
                        (
                            EventTree::node(n, Box::new(eprime_left), e_right.clone()),
                            c_left + 1,
                        )
                    } else {
                        let (eprime_right, c_right) =
                            Stamp::new(*i_right.clone(), *e_right.clone()).grow();
                        let (eprime_left, c_left) =
                            Stamp::new(*i_left.clone(), *e_left.clone()).grow();
                        if c_left < c_right {
                            (
                                EventTree::node(n, Box::new(eprime_left), e_right.clone()),
                                c_left + 1,
                            )
                        } else {
                            (
                                EventTree::node(n, e_left.clone(), Box::new(eprime_right)),
                                c_right + 1,
                            )
                        }
                    }
                } else {
                    // corrupted tree?
                    unreachable!()
                }
            }
        }
    }
}

pub trait Min<T> {
    fn min(&self) -> T;
}

pub trait Max<T> {
    fn max(&self) -> T;
}

impl Min<u32> for EventTree {
    fn min(&self) -> u32 {
        match *self {
            EventTree::Leaf { n } => n,
            EventTree::Node {
                n,
                ref left,
                ref right,
            } => n + cmp::min(left.min(), right.min()),
        }
    }
}

impl Max<u32> for EventTree {
    fn max(&self) -> u32 {
        match *self {
            EventTree::Leaf { n } => n,
            EventTree::Node {
                n,
                ref left,
                ref right,
            } => n + cmp::max(left.max(), right.max()),
        }
    }
}

pub trait Normalisable {
    fn norm(self) -> Self;
}

impl Normalisable for IdTree {
    #[allow(non_shorthand_field_patterns)]
    fn norm(self) -> IdTree {
        match self {
            IdTree::Leaf { i: _ } => {
                return self;
            }
            IdTree::Node { left, right } => {
                let norm_left = left.norm();
                let norm_right = right.norm();

                if let IdTree::Leaf { i: i1 } = norm_left {
                    if let IdTree::Leaf { i: i2 } = norm_right {
                        if i1 == i2 {
                            return norm_left;
                        }
                    }
                }

                return IdTree::node(Box::new(norm_left), Box::new(norm_right));
            }
        };
    }
}

impl Normalisable for EventTree {
    fn norm(self) -> EventTree {
        match self {
            EventTree::Leaf { n: _ } => {
                return self;
            }
            EventTree::Node { n, left, right } => {
                let norm_left = left.norm();
                let norm_right = right.norm();

                if let EventTree::Leaf { n: m1 } = norm_left {
                    if let EventTree::Leaf { n: m2 } = norm_right {
                        if m1 == m2 {
                            return EventTree::leaf(n + m1);
                        }
                    }
                }

                // normalised trees have min == n
                let min_left = norm_left.n();
                let min_right = norm_right.n();

                let m = cmp::min(min_left, min_right);

                return EventTree::node(
                    n + m,
                    Box::new(norm_left.sink(m)),
                    Box::new(norm_right.sink(m)),
                );
            }
        }
    }
}

impl Normalisable for Stamp {
    fn norm(self) -> Stamp {
        Stamp::new(self.i.norm(), self.e.norm())
    }
}

pub trait LessThanOrEqual {
    fn leq(&self, other: &Self) -> bool;
}

impl LessThanOrEqual for Stamp {
    fn leq(&self, other: &Stamp) -> bool {
        self.e.leq(&other.e)
    }
}

impl LessThanOrEqual for EventTree {
    #[allow(non_shorthand_field_patterns)]
    fn leq(&self, other: &EventTree) -> bool {
        match *self {
            EventTree::Leaf { n: n1 } => match *other {
                EventTree::Leaf { n: n2 } => n1 <= n2,
                EventTree::Node { n: n2, .. } => n1 <= n2,
            },
            EventTree::Node {
                n: n1,
                left: ref left1,
                right: ref right1,
            } => match *other {
                EventTree::Leaf { n: n2 } => {
                    (n1 <= n2)
                        && left1.clone().lift(n1).leq(&EventTree::leaf(n2))
                        && right1.clone().lift(n1).leq(&EventTree::leaf(n2))
                }
                EventTree::Node {
                    n: n2,
                    left: ref left2,
                    right: ref right2,
                } => {
                    (n1 <= n2)
                        && left1.clone().lift(n1).leq(&left2.clone().lift(n2))
                        && right1.clone().lift(n1).leq(&right2.clone().lift(n2))
                }
            },
        }
    }
}

pub trait Split {
    fn split(&self) -> Self;
}

impl Split for IdTree {
    fn split(&self) -> IdTree {
        match *self {
            IdTree::Leaf { i } => {
                if !i {
                    IdTree::node(Box::new(IdTree::zero()), Box::new(IdTree::zero()))
                } else {
                    let new_left = Box::new(IdTree::node(
                        Box::new(IdTree::one()),
                        Box::new(IdTree::zero()),
                    ));
                    let new_right = Box::new(IdTree::node(
                        Box::new(IdTree::zero()),
                        Box::new(IdTree::one()),
                    ));
                    IdTree::node(new_left, new_right)
                }
            }
            IdTree::Node {
                ref left,
                ref right,
            } => {
                if *left.as_ref() == IdTree::zero() {
                    // split always returns a Node, not a Leaf
                    if let IdTree::Node {
                        left: i1,
                        right: i2,
                    } = right.split()
                    {
                        let new_left = Box::new(IdTree::node(Box::new(IdTree::zero()), i1));
                        let new_right = Box::new(IdTree::node(Box::new(IdTree::zero()), i2));
                        IdTree::node(new_left, new_right)
                    } else {
                        unreachable!()
                    }
                } else if *right.as_ref() == IdTree::zero() {
                    if let IdTree::Node {
                        left: i1,
                        right: i2,
                    } = left.split()
                    {
                        let new_left = Box::new(IdTree::node(i1, Box::new(IdTree::zero())));
                        let new_right = Box::new(IdTree::node(i2, Box::new(IdTree::zero())));
                        IdTree::node(new_left, new_right)
                    } else {
                        unreachable!()
                    }
                } else {
                    let new_left = Box::new(IdTree::node(left.clone(), Box::new(IdTree::zero())));
                    let new_right = Box::new(IdTree::node(Box::new(IdTree::zero()), right.clone()));
                    IdTree::node(new_left, new_right)
                }
            }
        }
    }
}

/// Fallible union of two identities. Fails when both operands claim the
/// same point in `[0, 1]` — something that cannot happen for stamps
/// produced purely by the kernel from a common seed, but can happen if a
/// caller assembles a stamp from untrusted input.
pub trait TrySum {
    fn try_sum(&self, other: &Self) -> Result<Self>
    where
        Self: Sized;
}

impl TrySum for IdTree {
    fn try_sum(&self, other: &IdTree) -> Result<IdTree> {
        if *self == IdTree::zero() {
            return Ok(other.clone());
        } else if *other == IdTree::zero() {
            return Ok(self.clone());
        }

        match (self, other) {
            (
                IdTree::Node {
                    left: left1,
                    right: right1,
                },
                IdTree::Node {
                    left: left2,
                    right: right2,
                },
            ) => {
                let new_left = left1.try_sum(left2)?;
                let new_right = right1.try_sum(right2)?;
                Ok(IdTree::node(Box::new(new_left), Box::new(new_right)).norm())
            }
            // Both non-zero and not a Node/Node pair: either both are the
            // `One` leaf, or one is `One` while the other claims part of
            // the same region. Either way the two identities overlap.
            _ => Err(Error::OverlappingIds),
        }
    }
}

/// The kernel verbs: fork, event, join, peek, plus the send/receive/sync
/// composites built from them.
pub trait IntervalTreeClock
where
    Self: Sized,
{
    /// Split into two stamps with disjoint identities and the same event
    /// history.
    fn fork(&self) -> (Self, Self);

    /// Split into three stamps with pairwise-disjoint identities, all
    /// sharing the input's event history.
    fn fork3(&self) -> (Self, Self, Self);

    /// Split into four stamps with pairwise-disjoint identities, all
    /// sharing the input's event history.
    fn fork4(&self) -> (Self, Self, Self, Self);

    /// Strip identity, keeping only causal history. The result cannot
    /// inflate (`event` is a no-op on it).
    fn peek(&self) -> Self;

    /// Merge two stamps: union their identities, join their histories.
    /// Fails with [`Error::OverlappingIds`] if the identities were not
    /// actually disjoint.
    fn join(&self, other: &Self) -> Result<Self>;

    /// Inflate the event tree in the region owned by this stamp's
    /// identity. A no-op on an anonymous stamp (identity `0`).
    fn event(&self) -> Self;

    /// `event` then `peek`: the new local stamp and the anonymous message
    /// stamp to attach to an outgoing message.
    fn send(&self) -> (Self, Self);

    /// `join` then `event`: absorb a received message's history and tick.
    fn receive(&self, other: &Self) -> Result<Self>;

    /// `join` then `fork`: merge two stamps' full identities and split
    /// them back out, e.g. when two participants briefly share ownership.
    fn sync(&self, other: &Self) -> Result<(Self, Self)>;
}

impl IntervalTreeClock for Stamp {
    fn peek(&self) -> Stamp {
        Stamp::new(IdTree::zero(), self.e.clone())
    }

    fn fork(&self) -> (Stamp, Stamp) {
        if let IdTree::Node { left, right } = self.i.split() {
            let s1 = Stamp::new(*left, self.e.clone());
            let s2 = Stamp::new(*right, self.e.clone());
            (s1, s2)
        } else {
            unreachable!()
        }
    }

    fn fork3(&self) -> (Stamp, Stamp, Stamp) {
        let (a, b) = self.fork();
        let (a1, a2) = a.fork();
        (a1, a2, b)
    }

    fn fork4(&self) -> (Stamp, Stamp, Stamp, Stamp) {
        let (a, b) = self.fork();
        let (a1, a2) = a.fork();
        let (b1, b2) = b.fork();
        (a1, a2, b1, b2)
    }

    fn join(&self, other: &Stamp) -> Result<Stamp> {
        let sum_i = self.i.try_sum(&other.i)?;
        let join_e = self.e.join(&other.e);
        Ok(Stamp::new(sum_i, join_e))
    }

    fn event(&self) -> Stamp {
        if self.i.is_zero() {
            return self.clone();
        }

        let filled_e = self.fill();

        if filled_e.as_ref() != &self.e {
            Stamp::new(self.i.clone(), filled_e.into_owned())
        } else {
            let (eprime, _c) = self.grow();

            Stamp::new(self.i.clone(), eprime)
        }
    }

    fn send(&self) -> (Stamp, Stamp) {
        let s = self.event();
        let m = s.peek();
        (s, m)
    }

    fn receive(&self, other: &Stamp) -> Result<Stamp> {
        Ok(self.join(other)?.event())
    }

    fn sync(&self, other: &Stamp) -> Result<(Stamp, Stamp)> {
        Ok(self.join(other)?.fork())
    }
}
