//! Object Identifier (OID) type.
//!
//! An OID is the hierarchical key addressing one device-exposed value.
//! Stored as `SmallVec<[u32; 16]>` so typical MIB-II OIDs never touch the heap.

use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::fmt;

/// Maximum number of arcs (subidentifiers) allowed in an OID.
///
/// Per RFC 2578 Section 3.5: "there are at most 128 sub-identifiers in a
/// value". Enforced during wire decoding.
pub const MAX_OID_LEN: usize = 128;

/// Object Identifier.
///
/// Ordered lexicographically by arc sequence, which is the order agents
/// enumerate keys in. Prefix comparison ([`starts_with`](Oid::starts_with))
/// answers "does this key belong to subtree X".
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an empty OID.
    pub fn empty() -> Self {
        Self {
            arcs: SmallVec::new(),
        }
    }

    /// Create an OID from arc values.
    ///
    /// ```
    /// use snmpoll::Oid;
    ///
    /// let oid = Oid::new(vec![1, 3, 6, 1, 2, 1]);
    /// assert_eq!(oid.arcs(), &[1, 3, 6, 1, 2, 1]);
    /// ```
    pub fn new(arcs: impl IntoIterator<Item = u32>) -> Self {
        Self {
            arcs: arcs.into_iter().collect(),
        }
    }

    /// Create an OID from a slice of arcs.
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse an OID from dotted notation (e.g., "1.3.6.1.2.1.1.3.0").
    ///
    /// ```
    /// use snmpoll::Oid;
    ///
    /// let uptime = Oid::parse("1.3.6.1.2.1.1.3.0").unwrap();
    /// assert_eq!(uptime.len(), 9);
    /// assert!(Oid::parse("1.3.x").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let mut arcs = SmallVec::new();
        for part in s.split('.') {
            if part.is_empty() {
                continue;
            }
            let arc: u32 = part
                .parse()
                .map_err(|_| Error::InvalidOid(s.into()).boxed())?;
            arcs.push(arc);
        }
        Ok(Self { arcs })
    }

    /// The arc values.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Number of arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// True if the OID has no arcs.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// The final arc, if any.
    ///
    /// Useful for instance-suffixed columns where the last arc is a row
    /// index (e.g. `ifDescr.3` -> 3).
    pub fn last(&self) -> Option<u32> {
        self.arcs.last().copied()
    }

    /// Check whether `self` lies under `prefix` (or equals it).
    ///
    /// ```
    /// use snmpoll::{oid, Oid};
    ///
    /// let if_in_octets = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10, 3);
    /// assert!(if_in_octets.starts_with(&oid!(1, 3, 6, 1, 2, 1, 2, 2)));
    /// assert!(!if_in_octets.starts_with(&oid!(1, 3, 6, 1, 2, 1, 4)));
    /// assert!(if_in_octets.starts_with(&Oid::empty()));
    /// ```
    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.arcs.len() >= prefix.arcs.len() && self.arcs[..prefix.arcs.len()] == prefix.arcs[..]
    }

    /// The arcs remaining after `prefix`, or `None` when `self` does not
    /// start with it.
    ///
    /// This is the row-index extraction used by table reconstruction.
    pub fn strip_prefix(&self, prefix: &Oid) -> Option<&[u32]> {
        if self.starts_with(prefix) {
            Some(&self.arcs[prefix.arcs.len()..])
        } else {
            None
        }
    }

    /// Create a child OID by appending a single arc.
    pub fn child(&self, arc: u32) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Oid { arcs }
    }

    /// Create an OID by appending a run of arcs.
    ///
    /// ```
    /// use snmpoll::oid;
    ///
    /// let col = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10);
    /// assert_eq!(col.extend([7]), oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10, 7));
    /// ```
    pub fn extend(&self, suffix: impl IntoIterator<Item = u32>) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.extend(suffix);
        Oid { arcs }
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.arcs {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{}", arc)?;
            first = false;
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self::from_slice(arcs)
    }
}

impl<const N: usize> From<[u32; N]> for Oid {
    fn from(arcs: [u32; N]) -> Self {
        Self::new(arcs)
    }
}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Oid {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.arcs.cmp(&other.arcs)
    }
}

/// Create an OID from literal arcs.
///
/// ```
/// use snmpoll::oid;
///
/// let sys_uptime = oid!(1, 3, 6, 1, 2, 1, 1, 3, 0);
/// assert_eq!(sys_uptime.to_string(), "1.3.6.1.2.1.1.3.0");
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::Oid::from_slice(&[$($arc),*])
    };
}
