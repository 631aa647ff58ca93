//! Execution of single file actions into a staging directory
//!
//! Nothing here writes to the target directory. Destinations are only read,
//! for MERGE, to combine the existing document with the incoming one.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::common::fs as fs_utils;
use crate::domain::{ActionKind, ComponentPlan, FileAction};
use crate::error::{ConfstrapError, Result, fs as fs_error, install as install_error};
use crate::merge::{self, TemplateRenderer};
use crate::transaction::StagingTransaction;

/// Inputs shared by every action of one component
pub(crate) struct ActionContext<'a> {
    pub target_dir: &'a Path,
    pub renderer: &'a dyn TemplateRenderer,
    pub variables: BTreeMap<String, String>,
}

/// Write the result of `action` into the transaction's staging dir
///
/// Errors are reported as [`ConfstrapError::ActionFailed`].
pub(crate) fn execute(
    ctx: &ActionContext<'_>,
    transaction: &mut StagingTransaction,
    component: &ComponentPlan,
    action: &FileAction,
) -> Result<()> {
    if action.kind() == ActionKind::Skip {
        return Ok(());
    }

    stage_action(ctx, transaction, component, action).map_err(|e| {
        install_error::action_failed(
            action.kind(),
            Path::new(action.source_path()),
            Path::new(action.target_path()),
            e,
        )
    })
}

fn stage_action(
    ctx: &ActionContext<'_>,
    transaction: &mut StagingTransaction,
    component: &ComponentPlan,
    action: &FileAction,
) -> Result<()> {
    let source = component.source_root().join(action.source_path());
    let staged = transaction.stage(action.target_path())?;

    match action.kind() {
        ActionKind::Copy => fs_utils::copy_file(&source, &staged)?,
        ActionKind::Merge => {
            let destination = ctx.target_dir.join(action.target_path());
            let existing = read_optional(&destination)?;
            let incoming = read_text(&source)?;
            let merged = merge::merge_documents(
                existing.as_deref(),
                Path::new(action.target_path()),
                &incoming,
                Path::new(action.source_path()),
                component.merge_strategy(),
            )?;
            fs::write(&staged, merged).map_err(|e| fs_error::write_failed(&staged, e))?;
        }
        ActionKind::Template => {
            let template = read_text(&source)?;
            let rendered = ctx
                .renderer
                .render(&template, &ctx.variables)
                .map_err(|e| with_template_path(e, action.source_path()))?;
            fs::write(&staged, rendered).map_err(|e| fs_error::write_failed(&staged, e))?;
        }
        ActionKind::Skip => return Ok(()),
    }

    if let Some(mode) = action.mode() {
        fs_utils::set_mode(&staged, mode)?;
    }
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| fs_error::read_failed(path, e))
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    if path.is_file() {
        read_text(path).map(Some)
    } else {
        Ok(None)
    }
}

fn with_template_path(err: ConfstrapError, path: &str) -> ConfstrapError {
    match err {
        ConfstrapError::TemplateRenderFailed { reason, .. } => install_error::template_failed(path, reason),
        other => other,
    }
}
