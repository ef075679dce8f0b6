use carenote_core::drafts::{draft_key, DraftStore};
use carenote_core::models::DraftRecord;
use carenote_core::util::unix_millis_now;

use crate::commands::common::{draft_to_item, format_draft_lines, normalize_form_type, DraftListItem};
use crate::error::CliError;

pub fn run_list_drafts(store: &dyn DraftStore, as_json: bool) -> Result<(), CliError> {
    let drafts = store.list();

    if as_json {
        let now_ms = unix_millis_now();
        let json_items = drafts
            .iter()
            .map(|draft| draft_to_item(draft, now_ms))
            .collect::<Vec<DraftListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if drafts.is_empty() {
        println!("No drafts stored on this device.");
        return Ok(());
    }

    for line in format_draft_lines(&drafts) {
        println!("{line}");
    }
    Ok(())
}

pub fn find_draft(store: &dyn DraftStore, form_type: &str) -> Result<DraftRecord, CliError> {
    let form_type = normalize_form_type(form_type)?;
    store
        .get(&draft_key(&form_type))
        .ok_or(CliError::DraftNotFound(form_type))
}

pub fn run_show_draft(store: &dyn DraftStore, form_type: &str) -> Result<(), CliError> {
    let draft = find_draft(store, form_type)?;
    println!("{}", serde_json::to_string_pretty(&draft.payload)?);
    Ok(())
}

pub fn run_clear_draft(store: &dyn DraftStore, form_type: &str) -> Result<(), CliError> {
    let draft = find_draft(store, form_type)?;
    store.remove(&draft.form_key);
    println!("Cleared {}", draft.form_key);
    Ok(())
}
