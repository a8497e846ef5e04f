//! The Delete tool: validation only.
//!
//! Deliberately performs no storage mutation: it checks the intent
//! (confirmation present, id well-formed) and hands a validated value
//! back to the orchestrator, which owns the actual row removal and
//! renumbering.

use sceneforge_core::error::CoreError;
use sceneforge_core::types::DbId;

/// Input to the Delete tool.
#[derive(Debug, Clone, Copy)]
pub struct DeleteInput {
    pub scene_id: DbId,
    /// Explicit user confirmation. Destructive work never proceeds
    /// without it.
    pub confirmed: bool,
}

/// A validated deletion intent.
#[derive(Debug, Clone)]
pub struct DeleteIntent {
    pub scene_id: DbId,
    pub user_facing_message: String,
}

/// Validate a deletion request. A missing confirmation is a validation
/// failure with a message asking for it, never a silent no-op.
pub fn validate(input: DeleteInput) -> Result<DeleteIntent, CoreError> {
    if input.scene_id <= 0 {
        return Err(CoreError::Validation(format!(
            "Invalid scene id {}",
            input.scene_id
        )));
    }
    if !input.confirmed {
        return Err(CoreError::Validation(
            "Deleting a scene is permanent. Please confirm that you want it removed."
                .to_string(),
        ));
    }
    Ok(DeleteIntent {
        scene_id: input.scene_id,
        user_facing_message: "Removed the scene and renumbered the rest.".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn confirmed_delete_validates() {
        let intent = validate(DeleteInput {
            scene_id: 5,
            confirmed: true,
        })
        .unwrap();
        assert_eq!(intent.scene_id, 5);
    }

    #[test]
    fn unconfirmed_delete_is_validation_failure_with_prompt() {
        let err = validate(DeleteInput {
            scene_id: 5,
            confirmed: false,
        })
        .unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("confirm"));
    }

    #[test]
    fn nonsense_id_is_rejected() {
        let err = validate(DeleteInput {
            scene_id: 0,
            confirmed: true,
        })
        .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }
}
