//! Task → document file.

use bmadconv_markdown::clean_task_markup;
use bmadconv_shared::{DocumentFile, SourceKind, Task};

use super::MarkdownBody;

pub fn convert_task(task: &Task) -> DocumentFile {
    let title = if task.display_name.is_empty() {
        &task.name
    } else {
        &task.display_name
    };
    let description = if task.description.is_empty() {
        title.clone()
    } else {
        task.description.clone()
    };

    let instructions = if task.is_tagged {
        clean_task_markup(&task.content)
    } else {
        task.content.clone()
    };

    let mut body = MarkdownBody::default();
    body.line(format!("# {title}")).blank();
    if !task.description.is_empty() {
        body.line(task.description.as_str()).blank();
    }
    body.section("Instructions", &instructions);

    DocumentFile {
        id: task.canonical_id(),
        description,
        kind: SourceKind::Task,
        source_module: task.module.clone(),
        source_name: task.name.clone(),
        standalone: task.standalone,
        body: body.finish(),
    }
}
