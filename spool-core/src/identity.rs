//! Protocol identity numbers and names.
//!
//! Every protocol variant announces a fixed `(self, peer)` pair. The numbers
//! follow the Scalable Protocols registry: the high bits select the pattern,
//! the low nibble the role within it.

use std::fmt;

/// Scalable Protocols role identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ProtocolId {
    /// PAIR, exclusive bidirectional peer
    Pair = 0x10,

    /// PUB, broadcasts to subscribers
    Pub = 0x20,

    /// SUB, receives published messages
    Sub = 0x21,

    /// REQ, request side of request/reply
    Req = 0x30,

    /// REP, reply side of request/reply
    Rep = 0x31,

    /// PUSH, pipeline source
    Push = 0x50,

    /// PULL, pipeline sink
    Pull = 0x51,

    /// SURVEYOR, asks questions of respondents
    Surveyor = 0x62,

    /// RESPONDENT, answers surveys
    Respondent = 0x63,

    /// BUS, many-to-many mesh node
    Bus = 0x70,

    /// STAR, star topology node relaying between peers
    Star = 0x640,
}

impl ProtocolId {
    /// Get the protocol as a lowercase name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pair => "pair",
            Self::Pub => "pub",
            Self::Sub => "sub",
            Self::Req => "req",
            Self::Rep => "rep",
            Self::Push => "push",
            Self::Pull => "pull",
            Self::Surveyor => "surveyor",
            Self::Respondent => "respondent",
            Self::Bus => "bus",
            Self::Star => "star",
        }
    }

    /// Numeric identifier exchanged by transports.
    pub const fn number(self) -> u16 {
        self as u16
    }

    /// Check if this protocol may be connected to the given peer.
    pub fn is_compatible(&self, peer: ProtocolId) -> bool {
        matches!(
            (self, peer),
            (Self::Pair, Self::Pair)
                | (Self::Pub, Self::Sub)
                | (Self::Sub, Self::Pub)
                | (Self::Req, Self::Rep)
                | (Self::Rep, Self::Req)
                | (Self::Push, Self::Pull)
                | (Self::Pull, Self::Push)
                | (Self::Surveyor, Self::Respondent)
                | (Self::Respondent, Self::Surveyor)
                | (Self::Bus, Self::Bus)
                | (Self::Star, Self::Star)
        )
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static identity of a protocol implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Info {
    /// Our role
    pub self_id: ProtocolId,
    /// Role we talk to
    pub peer_id: ProtocolId,
    /// Our role's name
    pub self_name: &'static str,
    /// Peer role's name
    pub peer_name: &'static str,
}

impl Info {
    /// Build an identity whose names are the roles' canonical names.
    pub const fn new(self_id: ProtocolId, peer_id: ProtocolId) -> Self {
        Self {
            self_id,
            peer_id,
            self_name: self_id.as_str(),
            peer_name: peer_id.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_display() {
        assert_eq!(ProtocolId::Sub.to_string(), "sub");
        assert_eq!(ProtocolId::Pull.to_string(), "pull");
        assert_eq!(ProtocolId::Star.to_string(), "star");
    }

    #[test]
    fn test_protocol_numbers() {
        assert_eq!(ProtocolId::Pub.number(), 32);
        assert_eq!(ProtocolId::Sub.number(), 33);
        assert_eq!(ProtocolId::Push.number(), 80);
        assert_eq!(ProtocolId::Pull.number(), 81);
        assert_eq!(ProtocolId::Star.number(), 1600);
    }

    #[test]
    fn test_protocol_compatibility() {
        assert!(ProtocolId::Sub.is_compatible(ProtocolId::Pub));
        assert!(ProtocolId::Pull.is_compatible(ProtocolId::Push));
        assert!(ProtocolId::Star.is_compatible(ProtocolId::Star));

        assert!(!ProtocolId::Sub.is_compatible(ProtocolId::Sub));
        assert!(!ProtocolId::Pull.is_compatible(ProtocolId::Pub));
    }

    #[test]
    fn test_info_names() {
        let info = Info::new(ProtocolId::Sub, ProtocolId::Pub);
        assert_eq!(info.self_name, "sub");
        assert_eq!(info.peer_name, "pub");
    }
}
