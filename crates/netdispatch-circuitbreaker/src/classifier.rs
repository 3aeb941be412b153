//! Failure classification for circuit breaker decisions.

use std::sync::Arc;

/// Determines whether a `Result<Res, Err>` should be counted as a failure
/// for circuit breaker purposes.
pub trait FailureClassifier<Res, Err>: Send + Sync {
    fn classify(&self, result: &Result<Res, Err>) -> bool;
}

/// Treats every `Err(_)` as a failure and every `Ok(_)` as a success.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl<Res, Err> FailureClassifier<Res, Err> for DefaultClassifier {
    fn classify(&self, result: &Result<Res, Err>) -> bool {
        result.is_err()
    }
}

/// A failure classifier backed by a closure, for callers who want e.g. a
/// 5xx `Ok` response or a timeout-but-not-other-errors distinction.
#[derive(Clone)]
pub struct FnClassifier<F> {
    f: Arc<F>,
}

impl<F> FnClassifier<F> {
    pub fn new(f: F) -> Self {
        Self { f: Arc::new(f) }
    }
}

impl<F, Res, Err> FailureClassifier<Res, Err> for FnClassifier<F>
where
    F: Fn(&Result<Res, Err>) -> bool + Send + Sync,
{
    fn classify(&self, result: &Result<Res, Err>) -> bool {
        (self.f)(result)
    }
}

impl<F> std::fmt::Debug for FnClassifier<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnClassifier").field("f", &"<closure>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_classifier_treats_errors_as_failures() {
        let classifier = DefaultClassifier;
        assert!(!FailureClassifier::<(), ()>::classify(&classifier, &Ok(())));
        assert!(FailureClassifier::<(), ()>::classify(&classifier, &Err(())));
    }

    #[test]
    fn fn_classifier_custom_logic() {
        let classifier = FnClassifier::new(|result: &Result<(), String>| matches!(result, Err(e) if e.contains("fatal")));
        assert!(!classifier.classify(&Ok(())));
        assert!(!classifier.classify(&Err("warning".to_string())));
        assert!(classifier.classify(&Err("fatal error".to_string())));
    }

    #[test]
    fn fn_classifier_can_treat_some_successes_as_failures() {
        let classifier = FnClassifier::new(|result: &Result<u16, ()>| matches!(result, Ok(status) if *status >= 500) || result.is_err());
        assert!(!classifier.classify(&Ok(200)));
        assert!(classifier.classify(&Ok(500)));
        assert!(classifier.classify(&Err(())));
    }
}
