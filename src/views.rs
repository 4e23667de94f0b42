//! Server-rendered HTML pages

use std::fmt::Write;

use crate::{
    api::flash::FlashMessage,
    models::{Book, BookForm},
};

/// Escape text for use in HTML content and quoted attributes
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, flashes: &[FlashMessage], body: &str) -> String {
    let mut alerts = String::new();
    for flash in flashes {
        let _ = write!(
            alerts,
            r#"<div class="alert alert-{}">{}</div>"#,
            flash.level.as_str(),
            escape(&flash.text)
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - Library</title>
</head>
<body>
<nav><a href="/">Library</a> | <a href="/book/new">Add book</a></nav>
<div id="alert-container">{alerts}</div>
<main>
{body}
</main>
</body>
</html>"#,
        title = escape(title),
        alerts = alerts,
        body = body,
    )
}

/// Book list with edit and delete actions
pub fn index(books: &[Book], flashes: &[FlashMessage]) -> String {
    let mut body = String::from("<h1>Books</h1>\n");

    if books.is_empty() {
        body.push_str(r#"<p class="empty">No books in the library yet.</p>"#);
        return layout("Books", flashes, &body);
    }

    body.push_str(
        "<table>\n<thead><tr><th>Title</th><th>Author</th><th>ISBN</th><th>Status</th><th></th></tr></thead>\n<tbody>\n",
    );
    for book in books {
        let _ = writeln!(
            body,
            r#"<tr id="book-{id}"><td>{title}</td><td>{author}</td><td>{isbn}</td><td>{status}</td><td><a href="/book/{id}/update">Edit</a> <form method="post" action="/book/{id}/delete" onsubmit="return confirm('Delete this book?');"><button type="submit">Delete</button></form></td></tr>"#,
            id = book.id,
            title = escape(&book.title),
            author = escape(&book.author),
            isbn = escape(&book.isbn),
            status = if book.is_available { "Available" } else { "Checked out" },
        );
    }
    body.push_str("</tbody>\n</table>");

    layout("Books", flashes, &body)
}

fn text_inputs(form: &BookForm) -> String {
    format!(
        r#"<label>Title <input type="text" name="title" value="{title}" required></label>
<label>Author <input type="text" name="author" value="{author}" required></label>
<label>ISBN <input type="text" name="isbn" value="{isbn}" required></label>"#,
        title = escape(&form.title),
        author = escape(&form.author),
        isbn = escape(&form.isbn),
    )
}

/// Create form, prefilled with `form` after a failed submission
pub fn create_form(form: &BookForm, flashes: &[FlashMessage]) -> String {
    let body = format!(
        r#"<h1>Add book</h1>
<form method="post" action="/book/new">
{inputs}
<button type="submit">Add book</button>
</form>"#,
        inputs = text_inputs(form),
    );
    layout("Add book", flashes, &body)
}

/// Edit form for book `id`
pub fn edit_form(id: i64, form: &BookForm, flashes: &[FlashMessage]) -> String {
    let body = format!(
        r#"<h1>Edit book</h1>
<form method="post" action="/book/{id}/update">
{inputs}
<label><input type="checkbox" name="is_available"{checked}> Available</label>
<button type="submit">Save</button>
</form>"#,
        id = id,
        inputs = text_inputs(form),
        checked = if form.is_available() { " checked" } else { "" },
    );
    layout("Edit book", flashes, &body)
}

pub fn error_page(error: &str, flashes: &[FlashMessage]) -> String {
    let body = format!(
        r#"<h1>{}</h1>
<p><a href="/">Back to the library</a></p>"#,
        escape(error)
    );
    layout("Error", flashes, &body)
}
