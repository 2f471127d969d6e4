//! TypeScript definitions for the browser renderer.

use crate::content::{FaqEntry, Section};
use crate::faq::{ChatMessage, ChatRole};
use crate::index::Position;
use crate::lifecycle::LifecycleOutcome;
use crate::narration::{NarrationPath, NarrationStatus, VoiceSource};
use crate::navigation::Progress;
use crate::progress::{CompletionRecord, ProgressSnapshot};
use crate::view::{FaqItemView, GroupView, NarrationView, PageView, SectionLink};
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn export_single_type<T: TS + 'static>(out_dir: &Path) -> Result<(), String> {
    T::export_all_to(out_dir).map_err(|err| err.to_string())
}

/// Replace every `.ts` file in `out_dir` with freshly generated bindings
/// and an `index.ts` re-exporting them.
pub fn export_ts_bindings(out_dir: &Path) -> Result<(), String> {
    fs::create_dir_all(out_dir)
        .map_err(|err| format!("Failed to create {}: {err}", out_dir.display()))?;

    for entry in fs::read_dir(out_dir)
        .map_err(|err| format!("Failed to list {}: {err}", out_dir.display()))?
    {
        let entry = entry.map_err(|err| format!("Failed to read entry: {err}"))?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("ts") {
            fs::remove_file(&path)
                .map_err(|err| format!("Failed to remove {}: {err}", path.display()))?;
        }
    }

    export_single_type::<Section>(out_dir)?;
    export_single_type::<FaqEntry>(out_dir)?;
    export_single_type::<Position>(out_dir)?;
    export_single_type::<Progress>(out_dir)?;
    export_single_type::<NarrationStatus>(out_dir)?;
    export_single_type::<NarrationPath>(out_dir)?;
    export_single_type::<VoiceSource>(out_dir)?;
    export_single_type::<ProgressSnapshot>(out_dir)?;
    export_single_type::<CompletionRecord>(out_dir)?;
    export_single_type::<ChatRole>(out_dir)?;
    export_single_type::<ChatMessage>(out_dir)?;
    export_single_type::<LifecycleOutcome>(out_dir)?;
    export_single_type::<NarrationView>(out_dir)?;
    export_single_type::<SectionLink>(out_dir)?;
    export_single_type::<GroupView>(out_dir)?;
    export_single_type::<FaqItemView>(out_dir)?;
    export_single_type::<PageView>(out_dir)?;

    let index_content = r#"export type { Section } from "./Section";
export type { FaqEntry } from "./FaqEntry";
export type { Position } from "./Position";
export type { Progress } from "./Progress";
export type { NarrationStatus } from "./NarrationStatus";
export type { NarrationPath } from "./NarrationPath";
export type { VoiceSource } from "./VoiceSource";
export type { ProgressSnapshot } from "./ProgressSnapshot";
export type { CompletionRecord } from "./CompletionRecord";
export type { ChatRole } from "./ChatRole";
export type { ChatMessage } from "./ChatMessage";
export type { LifecycleOutcome } from "./LifecycleOutcome";
export type { NarrationView } from "./NarrationView";
export type { SectionLink } from "./SectionLink";
export type { GroupView } from "./GroupView";
export type { FaqItemView } from "./FaqItemView";
export type { PageView } from "./PageView";
"#;
    let index_path = out_dir.join("index.ts");
    fs::write(&index_path, index_content)
        .map_err(|err| format!("Failed to write {}: {err}", index_path.display()))?;
    Ok(())
}
