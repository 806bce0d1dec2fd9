//! Named suitability rules and the policy selecting which of them are active.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{BotError, Result};
use crate::types::Item;

static MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@[A-Za-z0-9_]+").expect("mention pattern is valid")
});

/// Words rejected by the `bl` rule unless the standard list is switched off.
pub const STANDARD_DENYLIST: &[&str] = &[
    "beeyotch", "biatch", "bitch", "chinaman", "chinamen", "chink", "crip", "cunt", "dago",
    "daygo", "dego", "dick", "douchebag", "dyke", "fag", "fatass", "fatso", "gash", "gimp",
    "golliwog", "gook", "gyp", "halfbreed", "half-breed", "homo", "hooker", "idiot", "insane",
    "insanitie", "insanity", "jap", "kike", "kraut", "lame", "lardass", "lesbo", "lunatic",
    "negro", "nigga", "nigger", "nigguh", "paki", "pickaninnie", "pickaninny", "pussie", "pussy",
    "raghead", "retard", "shemale", "skank", "slut", "spade", "spic", "spook", "tard", "tits",
    "titt", "trannie", "tranny", "twat", "wetback", "whore", "wop",
];

/// Rule codes of the default rule set, in evaluation order.
pub const DEFAULT_CODES: [&str; 7] = ["en", "bl", "@s", "ww", "\"\"", "rt", "id"];

type Predicate = dyn Fn(&Item) -> bool + Send + Sync;

/// A short code paired with a predicate an item must satisfy.
#[derive(Clone)]
pub struct Rule {
    code: String,
    predicate: Arc<Predicate>,
}

impl Rule {
    pub fn new<F>(code: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Item) -> bool + Send + Sync + 'static,
    {
        Self {
            code: code.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn check(&self, item: &Item) -> bool {
        (self.predicate)(item)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("code", &self.code).finish()
    }
}

/// Which rules of a [`RuleSet`] are evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AllowPolicy {
    #[default]
    AllowAll,
    OnlyNamed(BTreeSet<String>),
    AllExceptNamed(BTreeSet<String>),
}

impl AllowPolicy {
    pub fn only<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::OnlyNamed(codes.into_iter().map(Into::into).collect())
    }

    pub fn all_except<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AllExceptNamed(codes.into_iter().map(Into::into).collect())
    }

    pub fn is_active(&self, code: &str) -> bool {
        match self {
            Self::AllowAll => true,
            Self::OnlyNamed(codes) => codes.contains(code),
            Self::AllExceptNamed(codes) => !codes.contains(code),
        }
    }

    fn named(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::AllowAll => None,
            Self::OnlyNamed(codes) | Self::AllExceptNamed(codes) => Some(codes),
        }
    }
}

/// Case-insensitive word and phrase denylist for the `bl` rule.
///
/// [`Denylist::default`] holds [`STANDARD_DENYLIST`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denylist {
    words: Vec<String>,
}

impl Default for Denylist {
    fn default() -> Self {
        Self::new(STANDARD_DENYLIST)
    }
}

impl Denylist {
    /// A list holding exactly `words`.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::empty();
        list.add_words(words);
        list
    }

    pub fn empty() -> Self {
        Self { words: Vec::new() }
    }

    pub fn add_words<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            let word = word.as_ref().trim().to_lowercase();
            if !word.is_empty() && !self.words.contains(&word) {
                self.words.push(word);
            }
        }
    }

    pub fn remove_word(&mut self, word: &str) {
        let word = word.trim().to_lowercase();
        self.words.retain(|w| *w != word);
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// True when any listed word or phrase occurs anywhere in `text`.
    pub fn blacklisted(&self, text: &str) -> bool {
        if self.words.is_empty() {
            return false;
        }
        let text = text.to_lowercase();
        self.words.iter().any(|word| text.contains(word.as_str()))
    }
}

/// True when `text` holds an `@handle` token.
pub fn has_mention(text: &str) -> bool {
    MENTION.is_match(text)
}

/// Any `http` substring counts as a link.
pub fn has_link(text: &str) -> bool {
    text.contains("http")
}

/// Ordered rules plus the policy choosing which are active.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    policy: AllowPolicy,
}

impl RuleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The seven standard rules, rejecting the bot's own tweets by `own_handle`.
    pub fn defaults(own_handle: impl Into<String>, denylist: Denylist) -> Self {
        let own_handle = own_handle.into();
        let rules = vec![
            Rule::new("en", |item: &Item| item.lang.as_deref() == Some("en")),
            Rule::new("bl", move |item: &Item| !denylist.blacklisted(&item.text)),
            Rule::new("@s", |item: &Item| !has_mention(&item.text)),
            Rule::new("ww", |item: &Item| !has_link(&item.text)),
            Rule::new("\"\"", |item: &Item| !item.is_quote()),
            Rule::new("rt", |item: &Item| !item.is_retweet()),
            Rule::new("id", move |item: &Item| item.author() != own_handle),
        ];
        Self {
            rules,
            policy: AllowPolicy::AllowAll,
        }
    }

    /// Appends a rule. Codes must be unique within the set.
    pub fn with_rule(mut self, rule: Rule) -> Result<Self> {
        if self.rules.iter().any(|r| r.code == rule.code) {
            return Err(BotError::config_error(format!(
                "duplicate rule code '{}'",
                rule.code
            )));
        }
        self.rules.push(rule);
        Ok(self)
    }

    /// Replaces the policy. Every named code must belong to a rule in the set.
    pub fn with_policy(mut self, policy: AllowPolicy) -> Result<Self> {
        if let Some(named) = policy.named() {
            if let Some(unknown) = named.iter().find(|code| !self.contains(code)) {
                return Err(BotError::config_error(format!(
                    "unknown rule code '{unknown}' in allow policy"
                )));
            }
        }
        self.policy = policy;
        Ok(self)
    }

    pub fn policy(&self) -> &AllowPolicy {
        &self.policy
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rules.iter().any(|r| r.code == code)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules enabled by the policy, in set order.
    pub fn active_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules
            .iter()
            .filter(move |rule| self.policy.is_active(&rule.code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::User;

    fn suitable() -> Item {
        Item {
            id: 1,
            text: "a perfectly ordinary sentence".to_string(),
            lang: Some("en".to_string()),
            user: User {
                screen_name: "someone".to_string(),
            },
            ..Default::default()
        }
    }

    fn failing(rules: &RuleSet, item: &Item) -> Vec<String> {
        rules
            .active_rules()
            .filter(|rule| !rule.check(item))
            .map(|rule| rule.code().to_string())
            .collect()
    }

    #[test]
    fn test_default_codes_in_order() {
        let rules = RuleSet::defaults("mybot", Denylist::default());
        let codes: Vec<&str> = rules.rules().iter().map(Rule::code).collect();
        assert_eq!(codes, DEFAULT_CODES);
    }

    #[test]
    fn test_each_rule_flips_independently() {
        let rules = RuleSet::defaults("mybot", Denylist::new(["badword"]));
        assert!(failing(&rules, &suitable()).is_empty());

        let cases: Vec<(&str, Box<dyn Fn(&mut Item)>)> = vec![
            ("en", Box::new(|i: &mut Item| i.lang = Some("fr".into()))),
            ("bl", Box::new(|i: &mut Item| i.text = "what a BadWord".into())),
            ("@s", Box::new(|i: &mut Item| i.text = "hey @friend".into())),
            ("ww", Box::new(|i: &mut Item| i.text = "see http-ish things".into())),
            ("\"\"", Box::new(|i: &mut Item| i.is_quote_status = true)),
            ("rt", Box::new(|i: &mut Item| i.retweeted_status = Some(serde_json::json!({})))),
            ("id", Box::new(|i: &mut Item| i.user.screen_name = "mybot".into())),
        ];

        for (code, mutate) in cases {
            let mut item = suitable();
            mutate(&mut item);
            assert_eq!(failing(&rules, &item), vec![code.to_string()], "rule {code}");
        }
    }

    #[test]
    fn test_text_heuristics() {
        assert!(has_mention("ping @a"));
        assert!(!has_mention("mail me at @ home"));
        assert!(has_link("xhttpx"));
        assert!(!has_link("HTTP in caps"));
        assert!(!has_link("www.example.com"));
    }

    #[test]
    fn test_missing_lang_fails_en() {
        let rules = RuleSet::defaults("mybot", Denylist::default());
        let mut item = suitable();
        item.lang = None;
        assert_eq!(failing(&rules, &item), vec!["en".to_string()]);
    }

    #[test]
    fn test_standard_denylist_by_default() {
        let rules = RuleSet::defaults("mybot", Denylist::default());
        let mut item = suitable();
        item.text = "you RETARD".to_string();
        assert_eq!(failing(&rules, &item), vec!["bl".to_string()]);

        let rules = RuleSet::defaults("mybot", Denylist::empty());
        assert!(failing(&rules, &item).is_empty());
    }

    #[test]
    fn test_denylist_editing() {
        let mut list = Denylist::new(["Spam", "spam", "  "]);
        assert!(list.blacklisted("no SPAM please"));
        list.add_words(["buy now"]);
        assert!(list.blacklisted("Buy Now!"));
        list.remove_word("SPAM");
        assert!(!list.blacklisted("spam"));
        list.clear();
        assert!(list.is_empty());
        assert!(!list.blacklisted("buy now"));
    }

    #[test]
    fn test_policies() {
        let rules = RuleSet::defaults("mybot", Denylist::default());
        let all: Vec<&str> = rules.active_rules().map(Rule::code).collect();
        assert_eq!(all.len(), 7);

        let only = rules
            .clone()
            .with_policy(AllowPolicy::only(["rt", "en"]))
            .unwrap();
        let codes: Vec<&str> = only.active_rules().map(Rule::code).collect();
        assert_eq!(codes, vec!["en", "rt"]);

        let except = rules
            .with_policy(AllowPolicy::all_except(["@s", "ww"]))
            .unwrap();
        let codes: Vec<&str> = except.active_rules().map(Rule::code).collect();
        assert_eq!(codes, vec!["en", "bl", "\"\"", "rt", "id"]);
    }

    #[test]
    fn test_unknown_policy_code_rejected() {
        let rules = RuleSet::defaults("mybot", Denylist::default());
        let result = rules.with_policy(AllowPolicy::only(["zz"]));
        assert!(matches!(result, Err(BotError::ConfigError { .. })));
    }

    #[test]
    fn test_custom_rule() {
        let rules = RuleSet::defaults("mybot", Denylist::default())
            .with_rule(Rule::new("ln", |item: &Item| item.text.len() <= 10))
            .unwrap();
        assert_eq!(failing(&rules, &suitable()), vec!["ln".to_string()]);

        let duplicate = rules.with_rule(Rule::new("en", |_: &Item| true));
        assert!(matches!(duplicate, Err(BotError::ConfigError { .. })));
    }
}
