//! Query responder
//!
//! Answers A queries out of the per-source resolution tables. Each query falls
//! into one of two modes, decided by splitting its name at the first dot:
//!
//! - **Domain-scoped** (`printer.lan1.example.`): only the source whose domain
//!   equals the suffix is consulted.
//! - **Bare name** (`printer.`): every source is consulted and each one that
//!   knows the label contributes its own answer, named with its own domain.
//!
//! Anything that yields no answer, including every non-A query, becomes
//! [`Outcome::Delegate`] so the next resolver in the chain can have a go.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::name::{ROOT, split_name};
use crate::table::ResolutionTable;

/// TTL of every synthesised answer, in seconds
pub const ANSWER_TTL: u32 = 300;

/// DNS record type of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// IPv4 address
    A,
    /// IPv6 address
    Aaaa,
    /// Any other type, by its numeric code
    Other(u16),
}

impl From<u16> for RecordType {
    fn from(code: u16) -> Self {
        match code {
            1 => RecordType::A,
            28 => RecordType::Aaaa,
            other => RecordType::Other(other),
        }
    }
}

/// DNS class of an answer record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DnsClass {
    /// Internet
    In,
}

/// A parsed query, as handed over by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Requested name
    pub name: String,
    /// Requested record type
    pub record_type: RecordType,
}

impl Query {
    /// Create a query
    pub fn new(name: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            name: name.into(),
            record_type,
        }
    }

    /// Create an A query
    pub fn a(name: impl Into<String>) -> Self {
        Self::new(name, RecordType::A)
    }
}

/// One synthesised answer record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Fully qualified owner name
    pub name: String,
    /// Address
    pub addr: Ipv4Addr,
    /// Always [`RecordType::A`]
    pub record_type: RecordType,
    /// Always [`DnsClass::In`]
    pub class: DnsClass,
    /// Always [`ANSWER_TTL`]
    pub ttl: u32,
}

impl Answer {
    fn a(label: &str, domain: &str, addr: Ipv4Addr) -> Self {
        Self {
            name: format!("{label}{domain}"),
            addr,
            record_type: RecordType::A,
            class: DnsClass::In,
            ttl: ANSWER_TTL,
        }
    }
}

/// Successful response payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Set on every response this responder produces
    pub authoritative: bool,
    /// Answers, in source configuration order
    pub answers: Vec<Answer>,
}

/// What the transport should do with a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Reply with these records
    Answered(Response),
    /// Not ours, hand the query to the next resolver
    Delegate,
}

impl Outcome {
    /// The answers, empty for a delegation
    pub fn answers(&self) -> &[Answer] {
        match self {
            Outcome::Answered(response) => &response.answers,
            Outcome::Delegate => &[],
        }
    }

    /// Check if the query was delegated
    pub fn is_delegate(&self) -> bool {
        matches!(self, Outcome::Delegate)
    }
}

/// A source's domain paired with its table
#[derive(Debug, Clone)]
struct Zone {
    domain: String,
    table: Arc<ResolutionTable>,
}

/// Answers queries from a fixed set of resolution tables
///
/// Cheap to clone; clones share the tables and so see every refresh.
#[derive(Debug, Clone, Default)]
pub struct Responder {
    zones: Arc<Vec<Zone>>,
}

impl Responder {
    /// Create a responder over `(canonical domain, table)` pairs
    ///
    /// The order given is the order bare-name answers come back in.
    pub fn new(zones: impl IntoIterator<Item = (String, Arc<ResolutionTable>)>) -> Self {
        let zones = zones
            .into_iter()
            .map(|(domain, table)| Zone { domain, table })
            .collect();
        Self {
            zones: Arc::new(zones),
        }
    }

    /// Domains served, in order
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.zones.iter().map(|zone| zone.domain.as_str())
    }

    /// Resolve a query
    pub fn resolve(&self, query: &Query) -> Outcome {
        if query.record_type != RecordType::A {
            trace!("Delegating {:?} query for {}", query.record_type, query.name);
            return Outcome::Delegate;
        }

        let (label, domain) = split_name(&query.name);
        if label == ROOT {
            return Outcome::Delegate;
        }

        let answers: Vec<Answer> = if domain != ROOT {
            self.zones
                .iter()
                .find(|zone| zone.domain == domain)
                .and_then(|zone| answer(&label, zone))
                .into_iter()
                .collect()
        } else {
            self.zones
                .iter()
                .filter_map(|zone| answer(&label, zone))
                .collect()
        };

        if answers.is_empty() {
            trace!("No match for {}, delegating", query.name);
            return Outcome::Delegate;
        }

        Outcome::Answered(Response {
            authoritative: true,
            answers,
        })
    }
}

fn answer(label: &str, zone: &Zone) -> Option<Answer> {
    match zone.table.addr(label)? {
        IpAddr::V4(addr) => Some(Answer::a(label, &zone.domain, addr)),
        IpAddr::V6(addr) => addr
            .to_ipv4_mapped()
            .map(|addr| Answer::a(label, &zone.domain, addr)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotBuilder;
    use crate::traits::RawHostRecord;

    fn table(hosts: &[(&str, &str)]) -> Arc<ResolutionTable> {
        let records: Vec<_> = hosts
            .iter()
            .map(|(name, ip)| RawHostRecord::new(*name, *ip, true))
            .collect();
        let table = ResolutionTable::new();
        table.replace(SnapshotBuilder::new().build(&records));
        Arc::new(table)
    }

    fn responder() -> Responder {
        Responder::new([
            ("lan1.example.".to_string(), table(&[("printer", "10.0.0.7"), ("nas", "10.0.0.20")])),
            ("lan2.example.".to_string(), table(&[("nas", "10.0.1.20"), ("cam", "bogus"), ("v6only", "fe80::1")])),
        ])
    }

    #[test]
    fn test_record_type_codes() {
        assert_eq!(RecordType::from(1), RecordType::A);
        assert_eq!(RecordType::from(28), RecordType::Aaaa);
        assert_eq!(RecordType::from(16), RecordType::Other(16));
    }

    #[test]
    fn test_bare_name_single_source() {
        let outcome = responder().resolve(&Query::a("printer."));

        let Outcome::Answered(response) = outcome else {
            panic!("expected an answer");
        };
        assert!(response.authoritative);
        assert_eq!(
            response.answers,
            vec![Answer {
                name: "printer.lan1.example.".into(),
                addr: Ipv4Addr::new(10, 0, 0, 7),
                record_type: RecordType::A,
                class: DnsClass::In,
                ttl: 300,
            }]
        );
    }

    #[test]
    fn test_bare_name_fans_out_in_order() {
        let outcome = responder().resolve(&Query::a("NAS"));
        let names: Vec<_> = outcome.answers().iter().map(|a| a.name.as_str()).collect();

        assert_eq!(names, ["nas.lan1.example.", "nas.lan2.example."]);
    }

    #[test]
    fn test_scoped_name_consults_one_source() {
        let outcome = responder().resolve(&Query::a("nas.LAN2.example"));

        assert_eq!(outcome.answers().len(), 1);
        assert_eq!(outcome.answers()[0].addr, Ipv4Addr::new(10, 0, 1, 20));
    }

    #[test]
    fn test_scoped_miss_delegates() {
        let responder = responder();

        assert!(responder.resolve(&Query::a("printer.lan2.example.")).is_delegate());
        assert!(responder.resolve(&Query::a("printer.lan3.example.")).is_delegate());
        assert!(responder.resolve(&Query::a("printer.example.")).is_delegate());
    }

    #[test]
    fn test_unusable_addresses_delegate() {
        let responder = responder();

        assert!(responder.resolve(&Query::a("cam.lan2.example.")).is_delegate());
        assert!(responder.resolve(&Query::a("v6only.")).is_delegate());
    }

    #[test]
    fn test_non_a_query_delegates() {
        let responder = responder();

        assert!(responder.resolve(&Query::new("printer.", RecordType::Aaaa)).is_delegate());
        assert!(responder.resolve(&Query::new("printer.", RecordType::Other(16))).is_delegate());
    }

    #[test]
    fn test_empty_label_delegates() {
        assert!(responder().resolve(&Query::a(".lan1.example.")).is_delegate());
        assert!(responder().resolve(&Query::a(".")).is_delegate());
    }

    #[test]
    fn test_no_sources_delegates() {
        assert!(Responder::default().resolve(&Query::a("printer.")).is_delegate());
    }
}
