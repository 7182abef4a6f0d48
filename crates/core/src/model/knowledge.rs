use url::Url;

use crate::model::keys::{DisasterType, ModuleKey};

const WEB_SEARCH_BASE: &str = "https://www.google.com/search";

/// Where a suggested action takes the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionTarget {
    OpenModule(ModuleKey),
    StartDrill(DisasterType),
    EmergencyContacts,
    WebSearch(Url),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedAction {
    pub label: String,
    pub target: ActionTarget,
}

impl SuggestedAction {
    #[must_use]
    pub fn new(label: impl Into<String>, target: ActionTarget) -> Self {
        Self {
            label: label.into(),
            target,
        }
    }

    /// Search action for the verbatim query; `None` if the URL cannot be built.
    #[must_use]
    pub fn web_search(query: &str) -> Option<Self> {
        let url = Url::parse_with_params(WEB_SEARCH_BASE, &[("q", query)]).ok()?;
        Some(Self::new("Search the web", ActionTarget::WebSearch(url)))
    }
}

/// One keyword rule. `keyword` is stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeEntry {
    keyword: String,
    response: String,
    action: Option<SuggestedAction>,
}

impl KnowledgeEntry {
    #[must_use]
    pub fn new(
        keyword: impl Into<String>,
        response: impl Into<String>,
        action: Option<SuggestedAction>,
    ) -> Self {
        Self {
            keyword: keyword.into().trim().to_lowercase(),
            response: response.into(),
            action,
        }
    }

    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    #[must_use]
    pub fn response(&self) -> &str {
        &self.response
    }

    #[must_use]
    pub fn action(&self) -> Option<&SuggestedAction> {
        self.action.as_ref()
    }

    /// `normalized` must already be lowercase.
    fn matches(&self, normalized: &str) -> bool {
        !self.keyword.is_empty() && normalized.contains(self.keyword.as_str())
    }
}

/// Answer produced by the keyword table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeReply {
    pub text: String,
    pub action: Option<SuggestedAction>,
    /// Keyword that produced the reply, `None` for the fallback.
    pub matched: Option<String>,
}

/// Ordered keyword rules, evaluated top to bottom.
///
/// Matching is a plain substring test and the first declared rule wins, so an
/// input naming two topics always resolves to the earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
}

pub const EMPTY_QUESTION_REPLY: &str =
    "Ask me about earthquakes, floods, fires, first aid or emergency numbers.";

pub const FALLBACK_REPLY: &str = "I don't have specific guidance on that yet. \
     Try searching the web, or call 112 if this is an emergency.";

impl KnowledgeBase {
    #[must_use]
    pub fn new(entries: Vec<KnowledgeEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    /// First entry whose keyword occurs in `input`, case-insensitively.
    #[must_use]
    pub fn find(&self, input: &str) -> Option<&KnowledgeEntry> {
        let normalized = input.to_lowercase();
        self.entries.iter().find(|entry| entry.matches(&normalized))
    }

    #[must_use]
    pub fn respond(&self, input: &str) -> KnowledgeReply {
        if input.trim().is_empty() {
            return KnowledgeReply {
                text: EMPTY_QUESTION_REPLY.to_string(),
                action: None,
                matched: None,
            };
        }

        match self.find(input) {
            Some(entry) => KnowledgeReply {
                text: entry.response.clone(),
                action: entry.action.clone(),
                matched: Some(entry.keyword.clone()),
            },
            None => KnowledgeReply {
                text: FALLBACK_REPLY.to_string(),
                action: SuggestedAction::web_search(input),
                matched: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> KnowledgeBase {
        KnowledgeBase::new(vec![
            KnowledgeEntry::new(
                "earthquake",
                "Drop, cover, hold on.",
                Some(SuggestedAction::new(
                    "Open module",
                    ActionTarget::OpenModule(ModuleKey::Earthquake),
                )),
            ),
            KnowledgeEntry::new("flood", "Move to higher ground.", None),
        ])
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let reply = base().respond("What about EARTHQUAKE safety");
        assert_eq!(reply.matched.as_deref(), Some("earthquake"));
        assert_eq!(
            reply.action.map(|a| a.target),
            Some(ActionTarget::OpenModule(ModuleKey::Earthquake))
        );
    }

    #[test]
    fn first_declared_keyword_wins() {
        let reply = base().respond("flood and earthquake");
        assert_eq!(reply.matched.as_deref(), Some("earthquake"));
    }

    #[test]
    fn fallback_carries_search_for_verbatim_input() {
        let reply = base().respond("volcano tips & tricks");
        assert_eq!(reply.matched, None);
        assert_eq!(reply.text, FALLBACK_REPLY);
        let Some(SuggestedAction {
            target: ActionTarget::WebSearch(url),
            ..
        }) = reply.action
        else {
            panic!("expected web search action");
        };
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            query,
            vec![("q".to_string(), "volcano tips & tricks".to_string())]
        );
    }

    #[test]
    fn blank_input_gets_prompt() {
        let reply = base().respond("   ");
        assert_eq!(reply.text, EMPTY_QUESTION_REPLY);
        assert!(reply.action.is_none());
    }
}
