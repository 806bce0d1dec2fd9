use std::fmt;

use tracing::{debug, trace};

use crate::metrics::METRICS;
use crate::rules::RuleSet;
use crate::types::Item;

/// Result of one rule against one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub code: String,
    pub passed: bool,
}

/// Full verdict of a [`SuitabilityFilter`] over an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDecision {
    pub outcomes: Vec<RuleOutcome>,
    pub accepted: bool,
}

impl FilterDecision {
    pub fn failed(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| !o.passed)
            .map(|o| o.code.as_str())
    }

    pub fn outcome(&self, code: &str) -> Option<bool> {
        self.outcomes
            .iter()
            .find(|o| o.code == code)
            .map(|o| o.passed)
    }

    /// Per-rule markers: `+code` for a pass, `-code` for a failure.
    pub fn trace(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FilterDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, outcome) in self.outcomes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            let marker = if outcome.passed { '+' } else { '-' };
            write!(f, "{marker}{}", outcome.code)?;
        }
        Ok(())
    }
}

/// Applies a [`RuleSet`] to items. Read-only once built.
#[derive(Debug, Clone)]
pub struct SuitabilityFilter {
    rules: RuleSet,
}

impl SuitabilityFilter {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Evaluates every active rule without side effects.
    pub fn evaluate(&self, item: &Item) -> FilterDecision {
        let outcomes: Vec<RuleOutcome> = self
            .rules
            .active_rules()
            .map(|rule| RuleOutcome {
                code: rule.code().to_string(),
                passed: rule.check(item),
            })
            .collect();
        let accepted = outcomes.iter().all(|o| o.passed);
        FilterDecision { outcomes, accepted }
    }

    /// Evaluates `item` and reports the decision on the `twitbot::filter` target.
    pub fn accept(&self, item: &Item) -> bool {
        let decision = self.evaluate(item);

        if decision.accepted {
            trace!(
                target: "twitbot::filter",
                tweet_id = item.id,
                trace = %decision,
                verdict = "accepted",
                "accepted tweet"
            );
            METRICS.inc_items_evaluated("accepted");
        } else {
            let failed = decision.failed().collect::<Vec<_>>().join(",");
            debug!(
                target: "twitbot::filter",
                tweet_id = item.id,
                author = item.author(),
                trace = %decision,
                failed = %failed,
                verdict = "rejected",
                "rejected tweet"
            );
            METRICS.inc_items_evaluated("rejected");
            for code in decision.failed() {
                METRICS.inc_rule_failures(code);
            }
        }

        decision.accepted
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use super::*;
    use crate::rules::{AllowPolicy, Denylist, Rule};
    use crate::types::User;

    #[derive(Debug)]
    struct Recorded {
        level: Level,
        target: String,
        fields: BTreeMap<String, String>,
    }

    // Collects every event emitted while installed
    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Recorded>>>);

    struct Fields<'a>(&'a mut BTreeMap<String, String>);

    impl Visit for Fields<'_> {
        fn record_str(&mut self, field: &Field, value: &str) {
            self.0.insert(field.name().to_string(), value.to_string());
        }

        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            self.0.insert(field.name().to_string(), format!("{value:?}"));
        }
    }

    impl<S: Subscriber> Layer<S> for Recorder {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut fields = BTreeMap::new();
            event.record(&mut Fields(&mut fields));
            self.0.lock().unwrap().push(Recorded {
                level: *event.metadata().level(),
                target: event.metadata().target().to_string(),
                fields,
            });
        }
    }

    impl Recorder {
        fn capture<T>(&self, f: impl FnOnce() -> T) -> T {
            let subscriber = tracing_subscriber::registry().with(self.clone());
            tracing::subscriber::with_default(subscriber, f)
        }

        fn filter_events(&self, level: Level) -> Vec<BTreeMap<String, String>> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.target == "twitbot::filter" && e.level == level)
                .map(|e| e.fields.clone())
                .collect()
        }
    }

    fn filter() -> SuitabilityFilter {
        SuitabilityFilter::new(RuleSet::defaults("mybot", Denylist::default()))
    }

    fn tweet(text: &str) -> Item {
        Item {
            id: 42,
            text: text.to_string(),
            lang: Some("en".to_string()),
            user: User {
                screen_name: "someone".to_string(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_accepts_when_all_rules_pass() {
        let decision = filter().evaluate(&tweet("just a thought"));
        assert!(decision.accepted);
        assert_eq!(decision.outcomes.len(), 7);
        assert_eq!(decision.trace(), "+en +bl +@s +ww +\"\" +rt +id");
    }

    #[test]
    fn test_rejects_and_marks_failures() {
        let mut item = tweet("look @you http://x.y");
        item.user.screen_name = "mybot".to_string();
        let decision = filter().evaluate(&item);
        assert!(!decision.accepted);
        assert_eq!(decision.failed().collect::<Vec<_>>(), vec!["@s", "ww", "id"]);
        assert_eq!(decision.outcome("en"), Some(true));
        assert_eq!(decision.outcome("ww"), Some(false));
        assert_eq!(decision.outcome("zz"), None);
        assert_eq!(decision.trace(), "+en +bl -@s -ww +\"\" +rt -id");
    }

    #[test]
    fn test_accept_does_not_mutate_item() {
        let item = tweet("hello @there");
        let before = item.clone();
        assert!(!filter().accept(&item));
        assert_eq!(item, before);
    }

    #[test]
    fn test_rejection_emits_one_debug_event() {
        let recorder = Recorder::default();
        let filter = filter();

        let accepted = recorder.capture(|| filter.accept(&tweet("look @you http://x.y")));
        assert!(!accepted);

        let events = recorder.filter_events(Level::DEBUG);
        assert_eq!(events.len(), 1);
        let fields = &events[0];
        assert_eq!(fields["trace"], "+en +bl -@s -ww +\"\" +rt +id");
        assert_eq!(fields["failed"], "@s,ww");
        assert_eq!(fields["verdict"], "rejected");
        assert_eq!(fields["tweet_id"], "42");
    }

    #[test]
    fn test_acceptance_not_logged_at_debug() {
        let recorder = Recorder::default();
        let filter = filter();

        assert!(recorder.capture(|| filter.accept(&tweet("just a thought"))));

        assert!(recorder.filter_events(Level::DEBUG).is_empty());
        let traced = recorder.filter_events(Level::TRACE);
        assert_eq!(traced.len(), 1);
        assert_eq!(traced[0]["verdict"], "accepted");
    }

    #[test]
    fn test_policy_limits_evaluated_rules() {
        let rules = RuleSet::defaults("mybot", Denylist::default())
            .with_policy(AllowPolicy::all_except(["@s"]))
            .unwrap();
        let filter = SuitabilityFilter::new(rules);
        let decision = filter.evaluate(&tweet("hi @friend"));
        assert!(decision.accepted);
        assert_eq!(decision.outcome("@s"), None);
    }

    #[test]
    fn test_empty_rule_set_accepts_everything() {
        let filter = SuitabilityFilter::new(RuleSet::empty());
        assert!(filter.accept(&Item::default()));

        let filter = SuitabilityFilter::new(
            RuleSet::empty()
                .with_rule(Rule::new("no", |_: &Item| false))
                .unwrap(),
        );
        assert!(!filter.accept(&Item::default()));
    }
}
