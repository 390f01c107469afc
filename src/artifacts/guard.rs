use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactPresence {
    pub build_recipe: bool,
    pub run_manifest: bool,
}

impl ArtifactPresence {
    pub fn any(&self) -> bool {
        self.build_recipe || self.run_manifest
    }

    pub fn both(&self) -> bool {
        self.build_recipe && self.run_manifest
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProceedReason {
    NothingToOverwrite,
    Forced,
    Confirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GuardDecision {
    Proceed(ProceedReason),
    Declined,
}

impl GuardDecision {
    pub fn is_proceed(&self) -> bool {
        matches!(self, GuardDecision::Proceed(_))
    }
}

/// Authorizes generation iff nothing would be overwritten, `force` is set,
/// or `confirm` answers yes. `confirm` runs only in the last case.
pub fn authorize<E>(
    presence: ArtifactPresence,
    force: bool,
    confirm: impl FnOnce() -> Result<bool, E>,
) -> Result<GuardDecision, E> {
    if !presence.any() {
        return Ok(GuardDecision::Proceed(ProceedReason::NothingToOverwrite));
    }
    if force {
        return Ok(GuardDecision::Proceed(ProceedReason::Forced));
    }
    if confirm()? {
        Ok(GuardDecision::Proceed(ProceedReason::Confirmed))
    } else {
        Ok(GuardDecision::Declined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::convert::Infallible;
    use yare::parameterized;

    #[parameterized(
        absent_no_force_no = { false, false, false, false, Some(ProceedReason::NothingToOverwrite) },
        absent_no_force_yes = { false, false, false, true, Some(ProceedReason::NothingToOverwrite) },
        recipe_only_declined = { true, false, false, false, None },
        manifest_only_declined = { false, true, false, false, None },
        both_declined = { true, true, false, false, None },
        both_confirmed = { true, true, false, true, Some(ProceedReason::Confirmed) },
        both_forced = { true, true, true, false, Some(ProceedReason::Forced) },
        recipe_forced = { true, false, true, true, Some(ProceedReason::Forced) },
    )]
    fn test_authorize_table(
        recipe: bool,
        manifest: bool,
        force: bool,
        answer: bool,
        expected: Option<ProceedReason>,
    ) {
        let presence = ArtifactPresence {
            build_recipe: recipe,
            run_manifest: manifest,
        };
        let decision = authorize(presence, force, || Ok::<_, Infallible>(answer)).unwrap();
        match expected {
            Some(reason) => assert_eq!(decision, GuardDecision::Proceed(reason)),
            None => assert_eq!(decision, GuardDecision::Declined),
        }
    }

    #[test]
    fn test_confirmation_asked_only_when_needed() {
        let asked = Cell::new(0);
        let confirm = || {
            asked.set(asked.get() + 1);
            Ok::<_, Infallible>(true)
        };

        authorize(ArtifactPresence::default(), false, confirm).unwrap();
        assert_eq!(asked.get(), 0);

        let both = ArtifactPresence {
            build_recipe: true,
            run_manifest: true,
        };
        authorize(both, true, confirm).unwrap();
        assert_eq!(asked.get(), 0);

        authorize(both, false, confirm).unwrap();
        assert_eq!(asked.get(), 1);
    }

    #[test]
    fn test_confirmation_error_propagates() {
        let presence = ArtifactPresence {
            build_recipe: true,
            run_manifest: false,
        };
        let result = authorize(presence, false, || Err("no tty"));
        assert_eq!(result, Err("no tty"));
    }
}
