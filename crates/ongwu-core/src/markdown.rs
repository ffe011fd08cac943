//! Markdown export and import helpers.
//!
//! El documento exportado agrupa las notas por categoria y separa cada
//! nota con una regla horizontal, de forma que el archivo se puede
//! re-importar nota a nota.

use std::collections::BTreeMap;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::types::{Category, Note};

/// Etiqueta para notas sin categoria asignada.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Renderiza todas las notas de un usuario en un unico documento Markdown.
///
/// Las categorias aparecen en su orden manual (`sort_order`, luego nombre);
/// las notas sin categoria van al final.
pub fn export_document(
    notes: &[Note],
    categories: &[Category],
    exported_at: OffsetDateTime,
) -> String {
    let mut doc = String::new();
    doc.push_str("# Ongwu Notes Export\n\n");
    doc.push_str(&format!("**Exported**: {}\n", format_timestamp(exported_at)));
    doc.push_str(&format!("**Total notes**: {}\n\n", notes.len()));

    let mut ordered: Vec<&Category> = categories.iter().collect();
    ordered.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));

    // category id -> notas, en el orden en que llegaron (updated_at desc)
    let mut by_category: BTreeMap<Option<i64>, Vec<&Note>> = BTreeMap::new();
    for note in notes {
        by_category.entry(note.category_id).or_default().push(note);
    }

    for category in &ordered {
        if let Some(section) = by_category.remove(&Some(category.id)) {
            push_section(&mut doc, &category.name, &section);
        }
    }

    if let Some(section) = by_category.remove(&None) {
        push_section(&mut doc, UNCATEGORIZED, &section);
    }

    // Notas cuya categoria ya no existe (borrado blando) van como sin categoria
    for (_, section) in by_category {
        push_section(&mut doc, UNCATEGORIZED, &section);
    }

    doc
}

fn push_section(doc: &mut String, category_name: &str, notes: &[&Note]) {
    doc.push_str(&format!("## {}\n\n", category_name));

    for note in notes {
        doc.push_str(&format!("### {}\n\n", note.title));
        doc.push_str(&format!("**Created**: {}\n", format_timestamp(note.created_at)));
        doc.push_str(&format!("**Updated**: {}\n\n", format_timestamp(note.updated_at)));
        doc.push_str(&note.content);
        doc.push_str("\n\n---\n\n");
    }
}

fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_default()
}

/// Extrae el titulo de una nota importada a partir del nombre del archivo.
///
/// Solo se aceptan archivos `.md` (case-insensitive). Retorna `None` para
/// cualquier otra extension.
pub fn note_title_from_filename(filename: &str) -> Option<String> {
    let trimmed = filename.trim();
    let stem = trimmed
        .strip_suffix(".md")
        .or_else(|| trimmed.strip_suffix(".MD"))
        .or_else(|| trimmed.strip_suffix(".Md"))
        .or_else(|| trimmed.strip_suffix(".mD"))?;

    if stem.is_empty() {
        return None;
    }
    Some(stem.to_string())
}

/// Limpia un nombre de archivo para usarlo en Content-Disposition.
///
/// Conserva alfanumericos, punto, guion y guion bajo; todo lo demas pasa a
/// guion bajo y el resultado se corta a 100 caracteres.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(100)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn category(id: i64, name: &str, sort_order: i32) -> Category {
        Category {
            id,
            name: name.to_string(),
            description: None,
            user_id: 1,
            sort_order,
            created_at: datetime!(2025-01-01 0:00 UTC),
            updated_at: datetime!(2025-01-01 0:00 UTC),
        }
    }

    fn note(id: i64, title: &str, category_id: Option<i64>) -> Note {
        Note {
            id,
            title: title.to_string(),
            content: format!("content of {}", title),
            category_id,
            category_name: None,
            user_id: 1,
            created_at: datetime!(2025-02-01 9:00 UTC),
            updated_at: datetime!(2025-02-02 9:00 UTC),
        }
    }

    #[test]
    fn export_groups_by_category_in_sort_order() {
        let categories = vec![category(1, "Work", 2), category(2, "Ideas", 1)];
        let notes = vec![
            note(1, "standup", Some(1)),
            note(2, "side project", Some(2)),
            note(3, "loose thought", None),
        ];

        let doc = export_document(&notes, &categories, datetime!(2025-03-01 0:00 UTC));

        let ideas = doc.find("## Ideas").unwrap();
        let work = doc.find("## Work").unwrap();
        let uncategorized = doc.find("## Uncategorized").unwrap();

        assert!(ideas < work, "Ideas has lower sort_order, should come first");
        assert!(work < uncategorized, "Uncategorized always goes last");
        assert!(doc.contains("### standup"));
        assert!(doc.contains("**Total notes**: 3"));
    }

    #[test]
    fn export_separates_notes_with_rules() {
        let notes = vec![note(1, "a", None), note(2, "b", None)];
        let doc = export_document(&notes, &[], datetime!(2025-03-01 0:00 UTC));

        assert_eq!(doc.matches("\n---\n").count(), 2);
    }

    #[test]
    fn title_from_md_filename() {
        assert_eq!(note_title_from_filename("recipe.md"), Some("recipe".to_string()));
        assert_eq!(note_title_from_filename("Recipe.MD"), Some("Recipe".to_string()));
        assert_eq!(note_title_from_filename("notes.txt"), None);
        assert_eq!(note_title_from_filename(".md"), None);
    }

    #[test]
    fn sanitize_strips_header_unsafe_chars() {
        assert_eq!(sanitize_filename("my notes: 2025?.md"), "my_notes__2025_.md");
        assert_eq!(sanitize_filename("plain-name_1.md"), "plain-name_1.md");
    }

    #[test]
    fn sanitize_caps_length() {
        let long = "x".repeat(300);
        assert_eq!(sanitize_filename(&long).len(), 100);
    }
}
