use std::fmt::Write;

use super::widgets::{escape, render_widget};
use super::{error_message, Column, Layout, RenderError, View, ViewRenderer};

const JQUERY: &str = "https://code.jquery.com/jquery-3.7.1";
const DATATABLES: &str = "https://cdn.datatables.net/1.13.8/js/jquery.dataTables";
const DATATABLES_CSS: &str = "https://cdn.datatables.net/1.13.8/css/jquery.dataTables";

/// Server-side HTML pages
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    assets_prefix: String,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new("/statics")
    }
}

impl HtmlRenderer {
    pub fn new(assets_prefix: &str) -> Self {
        Self {
            assets_prefix: assets_prefix.trim_end_matches('/').to_string(),
        }
    }

    fn page(&self, layout: &Layout, body: &str, scripts: &str) -> Result<String, RenderError> {
        let min = if layout.minify { "min." } else { "" };
        let title = if layout.subtitle.is_empty() {
            escape(&layout.site_title)
        } else {
            format!("{} | {}", escape(&layout.subtitle), escape(&layout.site_title))
        };

        let mut out = String::new();
        write!(
            out,
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="icon" href="/favicon.ico">
<link rel="stylesheet" href="{assets}/admin.css">
<link rel="stylesheet" href="{dt_css}.{min}css">
</head>
<body>
"#,
            title = title,
            assets = self.assets_prefix,
            dt_css = DATATABLES_CSS,
            min = min,
        )?;

        out.push_str(&self.navbar(layout)?);
        write!(out, "<main class=\"container\">\n{}\n</main>\n", body)?;
        write!(
            out,
            "<footer class=\"footer\">&copy; {} {} &middot; v{}</footer>\n",
            layout.year,
            escape(&layout.site_title),
            escape(layout.version)
        )?;
        if !scripts.is_empty() {
            write!(
                out,
                "<script src=\"{}.{}js\"></script>\n<script src=\"{}.{}js\"></script>\n{}\n",
                JQUERY, min, DATATABLES, min, scripts
            )?;
        }
        out.push_str("</body>\n</html>\n");
        Ok(out)
    }

    fn navbar(&self, layout: &Layout) -> Result<String, RenderError> {
        let mut out = String::from("<header class=\"navbar\">");
        let brand = match &layout.logo {
            Some(logo) => format!("<img src=\"{}\" alt=\"\" class=\"logo\">", escape(logo)),
            None => String::new(),
        };
        write!(
            out,
            "<a class=\"brand\" href=\"/\">{}{}</a>",
            brand,
            escape(&layout.site_title)
        )?;

        if let Some(user) = &layout.user {
            out.push_str("<nav class=\"entities\">");
            for entry in &layout.entities {
                let active = if entry.title == layout.subtitle { " active" } else { "" };
                write!(
                    out,
                    "<a class=\"nav-link{}\" href=\"/{}\">{}</a>",
                    active,
                    escape(&entry.name),
                    escape(&entry.title)
                )?;
            }
            out.push_str("</nav>");
            write!(
                out,
                "<div class=\"account\"><span class=\"user\">{}</span>\
                 <a href=\"/password\">Change password</a>\
                 <a href=\"/logout\">Logout</a></div>",
                escape(user)
            )?;
        }
        out.push_str("</header>\n");
        Ok(out)
    }

    fn alert(code: Option<&String>) -> String {
        match code {
            Some(code) => format!(
                "<div class=\"alert alert-danger\" role=\"alert\">{}</div>",
                escape(error_message(code))
            ),
            None => String::new(),
        }
    }

    fn login(&self, layout: &Layout, reason: Option<&String>, username: Option<&String>) -> Result<String, RenderError> {
        let body = format!(
            r#"<form class="card auth" method="post" action="/login" autocomplete="off">
<h2>Login to your account</h2>
{alert}
<label>Username <input class="form-control" name="username" value="{username}" required autofocus></label>
<label>Password <input class="form-control" type="password" name="password" required></label>
<label class="form-check"><input class="form-check-input" type="checkbox" name="remember_me" value="on"> Remember me</label>
<button class="btn btn-primary" type="submit">Sign in</button>
</form>"#,
            alert = Self::alert(reason),
            username = escape(username.map(String::as_str).unwrap_or_default()),
        );
        self.page(layout, &body, "")
    }

    fn init(&self, layout: &Layout, error: Option<&String>) -> Result<String, RenderError> {
        let body = format!(
            r#"<form class="card auth" method="post" action="/reg" autocomplete="off">
<h2>Create the first admin</h2>
{alert}
<label>Username <input class="form-control" name="username" required autofocus></label>
<label>Password <input class="form-control" type="password" name="password" required></label>
<label>Confirm password <input class="form-control" type="password" name="confirm_password" required></label>
<button class="btn btn-primary" type="submit">Create</button>
</form>"#,
            alert = Self::alert(error),
        );
        self.page(layout, &body, "")
    }

    fn password(&self, layout: &Layout, error: Option<&String>) -> Result<String, RenderError> {
        let body = format!(
            r#"<form class="card auth" method="post" action="/password">
<h2>Change password</h2>
{alert}
<label>Current password <input class="form-control" type="password" name="old_password" required></label>
<label>New password <input class="form-control" type="password" name="new_password" required></label>
<label>Confirm new password <input class="form-control" type="password" name="confirm_password" required></label>
<button class="btn btn-primary" type="submit">Update</button>
</form>"#,
            alert = Self::alert(error),
        );
        self.page(layout, &body, "")
    }

    fn dashboard(&self, layout: &Layout, counts: &[(super::NavEntry, u64)]) -> Result<String, RenderError> {
        let mut body = String::from("<h1>Dashboard</h1>\n<div class=\"cards\">");
        for (entry, count) in counts {
            write!(
                body,
                "<a class=\"card\" href=\"/{}\"><span class=\"count\">{}</span><span>{}</span></a>",
                escape(&entry.name),
                count,
                escape(&entry.title)
            )?;
        }
        body.push_str("</div>");
        self.page(layout, &body, "")
    }

    fn index(&self, layout: &Layout, entity: &str, columns: &[Column]) -> Result<String, RenderError> {
        let mut body = String::new();
        write!(
            body,
            "<h1>{}</h1>\n<table id=\"dt\" class=\"display\" data-source=\"/dt/{}\"><thead><tr>",
            escape(&layout.subtitle),
            escape(entity)
        )?;
        for column in columns {
            write!(body, "<th>{}</th>", escape(&column.title))?;
        }
        body.push_str("</tr></thead><tbody></tbody></table>");

        let column_defs: Vec<String> = columns
            .iter()
            .map(|c| {
                format!(
                    "{{\"data\":{},\"orderable\":{}}}",
                    serde_json::Value::String(c.field.clone()),
                    c.orderable
                )
            })
            .collect();
        let script = format!(
            "<script>$(function(){{$('#dt').DataTable({{serverSide:true,processing:true,\
             ajax:{{url:$('#dt').data('source'),type:'POST'}},columns:[{}]}});}});</script>",
            column_defs.join(",")
        );
        self.page(layout, &body, &script)
    }

    fn edit(
        &self,
        layout: &Layout,
        entity: &str,
        id: i64,
        schema: &crate::form::FormSchema,
        values: &indexmap::IndexMap<String, serde_json::Value>,
    ) -> Result<String, RenderError> {
        let mut body = String::new();
        write!(
            body,
            "<h1><a href=\"/{0}\">{1}</a> #{2}</h1>\n<form class=\"card edit\" data-entity=\"{0}\" data-id=\"{2}\">",
            escape(entity),
            escape(&layout.subtitle),
            id
        )?;
        for (name, descriptor) in schema.iter() {
            let widget = render_widget(name, descriptor, values.get(name))?;
            write!(
                body,
                "<div class=\"field widget-{}\"><label for=\"f-{}\">{}</label>{}</div>",
                descriptor.widget.as_str(),
                escape(name),
                escape(&descriptor.display_name),
                widget
            )?;
        }
        body.push_str("</form>");
        self.page(layout, &body, "")
    }
}

impl ViewRenderer for HtmlRenderer {
    fn render(&self, view: &View) -> Result<String, RenderError> {
        match view {
            View::Login { layout, reason, username } => {
                self.login(layout, reason.as_ref(), username.as_ref())
            }
            View::Init { layout, error } => self.init(layout, error.as_ref()),
            View::Password { layout, error } => self.password(layout, error.as_ref()),
            View::Dashboard { layout, counts } => self.dashboard(layout, counts),
            View::Index { layout, entity, columns } => self.index(layout, entity, columns),
            View::Edit {
                layout,
                entity,
                id,
                schema,
                values,
            } => self.edit(layout, entity, *id, schema, values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityRegistry, RegistryOptions};
    use crate::views::NavEntry;
    use serde_json::json;

    fn registry() -> EntityRegistry {
        EntityRegistry::from_yaml(
            "entities:\n  - name: Post\n    title: Posts\n    fields:\n      - { name: id, type: int }\n      - { name: text, type: str }\n      - { name: published, type: bool }\n",
            &RegistryOptions::default(),
        )
        .unwrap()
    }

    fn layout(user: Option<&str>) -> Layout {
        let mut layout = Layout::new("Femto <Admin>", &registry()).user(user.map(String::from));
        layout.year = 2024;
        layout
    }

    #[test]
    fn login_page_escapes_and_shows_reason() {
        let html = HtmlRenderer::default()
            .render(&View::Login {
                layout: layout(None),
                reason: Some("password".into()),
                username: Some("\"bob\"".into()),
            })
            .unwrap();
        assert!(html.contains("<title>Femto &lt;Admin&gt;</title>"));
        assert!(html.contains("Wrong password"));
        assert!(html.contains("value=\"&quot;bob&quot;\""));
        assert!(!html.contains("/logout"));
    }

    #[test]
    fn navigation_lists_entities_for_signed_in_user() {
        let html = HtmlRenderer::default()
            .render(&View::Dashboard {
                layout: layout(Some("root")),
                counts: vec![(
                    NavEntry {
                        name: "Post".into(),
                        title: "Posts".into(),
                    },
                    12,
                )],
            })
            .unwrap();
        assert!(html.contains("href=\"/Post\">Posts</a>"));
        assert!(html.contains("<span class=\"count\">12</span>"));
        assert!(html.contains("/logout"));
        assert!(html.contains("&copy; 2024"));
    }

    #[test]
    fn index_page_wires_datatable() {
        let html = HtmlRenderer::new("/assets/")
            .render(&View::Index {
                layout: layout(Some("root")).subtitle("Posts"),
                entity: "Post".into(),
                columns: vec![
                    Column {
                        field: "id".into(),
                        title: "Id".into(),
                        orderable: true,
                    },
                    Column {
                        field: "tags".into(),
                        title: "Tags".into(),
                        orderable: false,
                    },
                ],
            })
            .unwrap();
        assert!(html.contains("data-source=\"/dt/Post\""));
        assert!(html.contains("{\"data\":\"tags\",\"orderable\":false}"));
        assert!(html.contains("href=\"/assets/admin.css\""));
        assert!(html.contains("jquery.dataTables.min.js"));
    }

    #[test]
    fn edit_page_renders_every_field() {
        let registry = registry();
        let post = registry.entity("Post").unwrap();
        let mut values = indexmap::IndexMap::new();
        values.insert("id".to_string(), json!(5));
        values.insert("text".to_string(), json!("hello"));
        values.insert("published".to_string(), json!(true));

        let mut layout = layout(Some("root")).subtitle("Posts");
        layout.minify = false;
        let html = HtmlRenderer::default()
            .render(&View::Edit {
                layout,
                entity: "Post".into(),
                id: 5,
                schema: post.schema.clone(),
                values,
            })
            .unwrap();
        assert!(html.contains("Posts</a> #5"));
        assert!(html.contains("name=\"text\""));
        assert!(html.contains("value=\"hello\""));
        assert!(html.contains(" checked"));
        assert!(html.contains("widget-checkbox"));
    }
}
