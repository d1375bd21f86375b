use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::metadata;
use crate::error::MergeError;
use crate::io::{LoadedPdf, PdfReader, PdfWriter};
use crate::model::ExportMetadata;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Outcome of a successful merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    /// Where the merged PDF was written.
    pub output: PathBuf,
    /// Inputs whose pages made it into the output.
    pub members_merged: usize,
    /// Inputs that were missing or unreadable.
    pub skipped: usize,
    /// Page count of the merged document.
    pub total_pages: usize,
}

/// Concatenates PDFs in order.
pub struct Merger;

impl Merger {
    /// Merge `paths` in order into a single PDF at `output`.
    ///
    /// Inputs that are missing, unreadable or have no pages are skipped with
    /// a warning; the merge only fails when nothing is left. The first usable
    /// input is the base document; the pages of every later input are
    /// appended to its root page tree after renumbering their objects.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    ///
    /// * No input could be read ([`MergeError::NothingToMerge`]).
    /// * The page tree of an input is malformed ([`MergeError::Pdf`]).
    /// * The output was not written or is empty ([`MergeError::EmptyOutput`]).
    pub fn merge(
        paths: &[PathBuf],
        output: &Path,
        meta: &ExportMetadata,
    ) -> Result<MergeSummary, MergeError> {
        let mut members = Vec::with_capacity(paths.len());
        let mut skipped = 0;

        for (idx, path) in paths.iter().enumerate() {
            match PdfReader::read(path) {
                Ok(loaded) => {
                    debug!(
                        position = idx,
                        path = %path.display(),
                        pages = loaded.page_count,
                        "Merge member loaded"
                    );
                    members.push(loaded);
                }
                Err(issue) => {
                    warn!(position = idx, path = %path.display(), %issue, "Skipping merge member");
                    skipped += 1;
                }
            }
        }

        let members_merged = members.len();
        let mut members = members.into_iter();
        let Some(LoadedPdf { document: mut merged, .. }) = members.next() else {
            return Err(MergeError::NothingToMerge {
                attempted: paths.len(),
            });
        };

        let mut max_id = merged.max_id;
        for LoadedPdf { document: mut doc, path, page_count } in members {
            // Avoid object id collisions with everything merged so far
            doc.renumber_objects_with(max_id + 1);
            max_id = doc.max_id;

            let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
            for &page_id in &page_ids {
                inline_inherited_attributes(&mut doc, page_id);
            }

            merged.objects.extend(doc.objects);
            append_pages_to_page_tree(&mut merged, &page_ids)?;

            debug!(path = %path.display(), pages = page_count, "Pages appended");
        }

        merged.prune_objects();
        merged.renumber_objects();
        metadata::apply(&mut merged, meta);
        merged.compress();

        let total_pages = merged.get_pages().len();

        let written = PdfWriter::write(&mut merged, output).map_err(|err| MergeError::Pdf {
            reason: format!("failed to write {}: {err}", output.display()),
        })?;
        if written == 0 {
            return Err(MergeError::EmptyOutput {
                path: output.to_path_buf(),
            });
        }

        info!(
            output = %output.display(),
            members = members_merged,
            skipped,
            pages = total_pages,
            bytes = written,
            "PDF merged"
        );

        Ok(MergeSummary {
            output: output.to_path_buf(),
            members_merged,
            skipped,
            total_pages,
        })
    }
}

/// Append page references to the root Pages node and re-parent them.
fn append_pages_to_page_tree(merged: &mut Document, page_ids: &[ObjectId]) -> Result<(), MergeError> {
    let pages_id = merged.catalog()?.get(b"Pages")?.as_reference()?;

    for &id in page_ids {
        if let Ok(page) = merged.get_object_mut(id).and_then(Object::as_dict_mut) {
            page.set("Parent", pages_id);
        }
    }

    let pages = merged.get_object_mut(pages_id)?.as_dict_mut()?;
    let kids = pages.get_mut(b"Kids")?.as_array_mut()?;
    kids.extend(page_ids.iter().map(|&id| Object::Reference(id)));

    let count = pages.get(b"Count")?.as_i64()?;
    pages.set("Count", count + page_ids.len() as i64);

    Ok(())
}

/// Copy attributes a page inherits from its page tree ancestors onto the
/// page itself, so it keeps them once re-parented.
fn inline_inherited_attributes(doc: &mut Document, page_id: ObjectId) {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return;
    };

    let mut inherited = Dictionary::new();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    // Bounded walk, in case of a cyclic tree
    for _ in 0..64 {
        let Some(node) = parent.and_then(|id| doc.get_dictionary(id).ok()) else {
            break;
        };
        for key in INHERITABLE {
            if !page.has(key) && !inherited.has(key) {
                if let Ok(value) = node.get(key) {
                    inherited.set(key.to_vec(), value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    if let Ok(page) = doc.get_dictionary_mut(page_id) {
        for (key, value) in inherited {
            page.set(key, value);
        }
    }
}
