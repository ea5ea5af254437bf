use serde::Serialize;

use crate::models::place::PlaceSuggestion;

/// Identity of one issued search. Only the most recently issued ticket may
/// update the visible list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub query: String,
}

/// Autocomplete state for one input field.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SuggestionFeed {
    #[serde(skip)]
    latest_seq: u64,
    query: String,
    suggestions: Vec<PlaceSuggestion>,
}

impl SuggestionFeed {
    pub fn issue(&mut self, query: impl Into<String>) -> SearchTicket {
        self.latest_seq += 1;
        self.query = query.into();

        SearchTicket {
            seq: self.latest_seq,
            query: self.query.clone(),
        }
    }

    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        ticket.seq == self.latest_seq
    }

    /// Stores `results` if `ticket` is still the latest query. Returns
    /// whether the results were applied.
    pub fn apply(&mut self, ticket: &SearchTicket, results: Vec<PlaceSuggestion>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }

        self.suggestions = results;
        true
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[PlaceSuggestion] {
        &self.suggestions
    }

    /// Empties the list once a place has been picked. Searches still in
    /// flight can no longer repopulate it.
    pub fn clear(&mut self) {
        self.latest_seq += 1;
        self.suggestions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::SuggestionFeed;
    use crate::models::place::PlaceSuggestion;

    fn hit(id: u64, label: &str) -> PlaceSuggestion {
        PlaceSuggestion {
            id,
            label: label.to_string(),
            lat: 23.8,
            lng: 90.4,
        }
    }

    #[test]
    fn newer_query_wins_even_if_older_resolves_last() {
        let mut feed = SuggestionFeed::default();
        let first = feed.issue("Ban");
        let second = feed.issue("Banani");

        assert!(feed.apply(&second, vec![hit(2, "Banani")]));
        assert!(!feed.apply(&first, vec![hit(1, "Bangla Motor")]));

        assert_eq!(feed.query(), "Banani");
        assert_eq!(feed.suggestions(), &[hit(2, "Banani")]);
    }

    #[test]
    fn older_query_resolving_first_is_still_discarded() {
        let mut feed = SuggestionFeed::default();
        let first = feed.issue("Gul");
        let second = feed.issue("Gulshan");

        assert!(!feed.apply(&first, vec![hit(1, "Gulistan")]));
        assert!(feed.suggestions().is_empty());
        assert!(feed.apply(&second, vec![hit(2, "Gulshan")]));
        assert_eq!(feed.suggestions().len(), 1);
    }

    #[test]
    fn sequence_numbers_increase() {
        let mut feed = SuggestionFeed::default();
        let a = feed.issue("a");
        let b = feed.issue("a");
        assert!(b.seq > a.seq);
        assert!(!feed.is_current(&a));
        assert!(feed.is_current(&b));
    }

    #[test]
    fn clearing_invalidates_in_flight_search() {
        let mut feed = SuggestionFeed::default();
        let ticket = feed.issue("Motijheel");
        feed.clear();

        assert!(!feed.apply(&ticket, vec![hit(3, "Motijheel")]));
        assert!(feed.suggestions().is_empty());
    }
}
