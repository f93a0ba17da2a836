// libs/booking-cell/src/services/identity.rs
use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use shared_models::{Client, ClientContact};

use crate::models::{BookingError, SubmittedContact};
use crate::services::store::BookingStore;

/// Longest national number (two-digit area code plus nine-digit mobile).
const MAX_NATIONAL_DIGITS: usize = 11;

// ==============================================================================
// NORMALIZATION
// ==============================================================================

/// Digits only, with an international `00` prefix and the country code stripped
/// when what remains is longer than a national number.
pub fn normalize_whatsapp(raw: &str, country_code: &str) -> Option<String> {
    let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() > MAX_NATIONAL_DIGITS && digits.starts_with("00") {
        digits.drain(..2);
    }
    if !country_code.is_empty()
        && digits.len() > MAX_NATIONAL_DIGITS
        && digits.starts_with(country_code)
    {
        digits.drain(..country_code.len());
    }

    (!digits.is_empty()).then_some(digits)
}

pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    (!email.is_empty()).then_some(email)
}

/// Comparison form of a name: lowercase with whitespace runs collapsed.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Contact details reduced to the form used for identity comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedContact {
    pub name: String,
    pub email: Option<String>,
    pub whatsapp: Option<String>,
}

impl NormalizedContact {
    pub fn from_parts(
        name: &str,
        email: Option<&str>,
        whatsapp: Option<&str>,
        country_code: &str,
    ) -> Self {
        Self {
            name: normalize_name(name),
            email: email.and_then(normalize_email),
            whatsapp: whatsapp.and_then(|w| normalize_whatsapp(w, country_code)),
        }
    }

    pub fn of_client(client: &Client, country_code: &str) -> Self {
        Self::from_parts(
            &client.name,
            client.email.as_deref(),
            client.whatsapp.as_deref(),
            country_code,
        )
    }
}

// ==============================================================================
// MATCHING
// ==============================================================================

#[derive(Clone, Copy)]
pub struct ClientMatcher {
    pub name: &'static str,
    matches: fn(&NormalizedContact, &NormalizedContact) -> bool,
}

impl ClientMatcher {
    pub const fn new(
        name: &'static str,
        matches: fn(&NormalizedContact, &NormalizedContact) -> bool,
    ) -> Self {
        Self { name, matches }
    }

    pub fn matches(&self, incoming: &NormalizedContact, existing: &NormalizedContact) -> bool {
        (self.matches)(incoming, existing)
    }
}

fn same_whatsapp(incoming: &NormalizedContact, existing: &NormalizedContact) -> bool {
    matches!((&incoming.whatsapp, &existing.whatsapp), (Some(a), Some(b)) if a == b)
}

fn same_email(incoming: &NormalizedContact, existing: &NormalizedContact) -> bool {
    matches!((&incoming.email, &existing.email), (Some(a), Some(b)) if a == b)
}

fn same_name(incoming: &NormalizedContact, existing: &NormalizedContact) -> bool {
    !incoming.name.is_empty() && incoming.name == existing.name
}

pub const MATCH_BY_WHATSAPP: ClientMatcher = ClientMatcher::new("whatsapp", same_whatsapp);
pub const MATCH_BY_EMAIL: ClientMatcher = ClientMatcher::new("email", same_email);
pub const MATCH_BY_NAME: ClientMatcher = ClientMatcher::new("name", same_name);

/// Matchers tried in priority order. Each matcher scans every existing client
/// before the next, lower-priority matcher is consulted.
#[derive(Clone)]
pub struct MatchPolicy {
    matchers: Vec<ClientMatcher>,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self::new(vec![MATCH_BY_WHATSAPP, MATCH_BY_EMAIL, MATCH_BY_NAME])
    }
}

impl MatchPolicy {
    pub fn new(matchers: Vec<ClientMatcher>) -> Self {
        Self { matchers }
    }

    pub fn find_match<'a>(
        &self,
        incoming: &NormalizedContact,
        candidates: &'a [(Client, NormalizedContact)],
    ) -> Option<(&'a Client, &'static str)> {
        self.matchers.iter().find_map(|matcher| {
            candidates
                .iter()
                .find(|(_, existing)| matcher.matches(incoming, existing))
                .map(|(client, _)| (client, matcher.name))
        })
    }
}

// ==============================================================================
// RESOLVER
// ==============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedClient {
    pub client_id: Uuid,
    pub created: bool,
    pub matched_by: Option<&'static str>,
}

pub struct ClientIdentityResolver {
    store: Arc<dyn BookingStore>,
    policy: MatchPolicy,
    country_code: String,
}

impl ClientIdentityResolver {
    pub fn new(store: Arc<dyn BookingStore>, country_code: impl Into<String>) -> Self {
        Self::with_policy(store, country_code, MatchPolicy::default())
    }

    pub fn with_policy(
        store: Arc<dyn BookingStore>,
        country_code: impl Into<String>,
        policy: MatchPolicy,
    ) -> Self {
        Self {
            store,
            policy,
            country_code: country_code.into(),
        }
    }

    /// Reuses the professional's existing client record when the submission
    /// matches one, refreshing its contact details; otherwise creates a new one.
    #[instrument(skip(self, contact))]
    pub async fn resolve(
        &self,
        professional_id: Uuid,
        contact: &SubmittedContact,
    ) -> Result<ResolvedClient, BookingError> {
        let incoming = NormalizedContact::from_parts(
            &contact.name,
            contact.email.as_deref(),
            contact.whatsapp.as_deref(),
            &self.country_code,
        );

        let clients = self
            .store
            .list_clients(professional_id)
            .await
            .map_err(BookingError::ClientPersistence)?;

        let candidates: Vec<(Client, NormalizedContact)> = clients
            .into_iter()
            .map(|client| {
                let normalized = NormalizedContact::of_client(&client, &self.country_code);
                (client, normalized)
            })
            .collect();

        let fresh = ClientContact {
            name: contact.name.clone(),
            email: incoming.email.clone(),
            whatsapp: incoming.whatsapp.clone(),
        };

        match self.policy.find_match(&incoming, &candidates) {
            Some((client, matched_by)) => {
                debug!(client_id = %client.id, matched_by, "Matched existing client");

                self.store
                    .update_client(client.id, &fresh)
                    .await
                    .map_err(BookingError::ClientPersistence)?;

                Ok(ResolvedClient {
                    client_id: client.id,
                    created: false,
                    matched_by: Some(matched_by),
                })
            }
            None => {
                let client = self
                    .store
                    .insert_client(professional_id, &fresh)
                    .await
                    .map_err(BookingError::ClientPersistence)?;

                info!(client_id = %client.id, "Created client from public booking");

                Ok(ResolvedClient {
                    client_id: client.id,
                    created: true,
                    matched_by: None,
                })
            }
        }
    }
}
