//! Template renderer module.
//!
//! Renders parsed template nodes with the given context.

use super::parser::Node;
use super::{escape_html, Result, TemplateContext, TemplateError, Value};

/// Template renderer.
pub struct Renderer<'a> {
    context: &'a TemplateContext,
}

impl<'a> Renderer<'a> {
    /// Create a new renderer with the given context.
    pub fn new(context: &'a TemplateContext) -> Self {
        Self { context }
    }

    /// Render a list of nodes to a string.
    pub fn render(&self, nodes: &[Node]) -> Result<String> {
        let mut output = String::new();
        for node in nodes {
            self.render_node(node, &mut output)?;
        }
        Ok(output)
    }

    fn render_node(&self, node: &Node, output: &mut String) -> Result<()> {
        match node {
            Node::Text(text) => output.push_str(text),
            Node::Variable(name) => {
                if let Some(value) = self.context.get(name) {
                    output.push_str(&escape_html(&value.to_display_string()));
                }
            }
            Node::RawVariable(name) => {
                if let Some(value) = self.context.get(name) {
                    output.push_str(&value.to_display_string());
                }
            }
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let branch = if self.is_truthy(condition) {
                    then_branch
                } else {
                    else_branch
                };
                output.push_str(&self.render(branch)?);
            }
            Node::Each {
                variable,
                item_name,
                body,
            } => output.push_str(&self.render_each(variable, item_name.as_deref(), body)?),
            Node::Unless { condition, body } => {
                if !self.is_truthy(condition) {
                    output.push_str(&self.render(body)?);
                }
            }
            Node::With { variable, body } => output.push_str(&self.render_with(variable, body)?),
        }
        Ok(())
    }

    fn is_truthy(&self, name: &str) -> bool {
        self.context
            .get(name)
            .map(|v| v.is_truthy())
            .unwrap_or(false)
    }

    fn render_each(&self, variable: &str, item_name: Option<&str>, body: &[Node]) -> Result<String> {
        let list = match self.context.get(variable) {
            Some(Value::List(items)) => items,
            Some(Value::Null) | None => return Ok(String::new()),
            Some(_) => {
                return Err(TemplateError::Render(format!("'{variable}' is not a list")));
            }
        };

        let mut output = String::new();
        let item_var_name = item_name.unwrap_or("this");

        for (index, item) in list.iter().enumerate() {
            let mut child_context = self.context.child();
            child_context.set(item_var_name, item.clone());
            child_context.set("@index", Value::Number(index as i64));
            child_context.set("@first", Value::Bool(index == 0));
            child_context.set("@last", Value::Bool(index == list.len() - 1));

            // Object fields are visible without a prefix.
            if let Value::Object(obj) = item {
                for (key, value) in obj {
                    child_context.set(key.clone(), value.clone());
                }
            }

            output.push_str(&Renderer::new(&child_context).render(body)?);
        }

        Ok(output)
    }

    fn render_with(&self, variable: &str, body: &[Node]) -> Result<String> {
        let value = match self.context.get(variable) {
            Some(v) if v.is_truthy() => v.clone(),
            _ => return Ok(String::new()),
        };

        let mut child_context = self.context.child();
        if let Value::Object(obj) = &value {
            for (key, val) in obj {
                child_context.set(key.clone(), val.clone());
            }
        }
        child_context.set("this", value);

        Renderer::new(&child_context).render(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Parser;
    use serde_json::json;

    fn render(template: &str, data: serde_json::Value) -> String {
        let context = TemplateContext::from_json(data);
        let nodes = Parser::new(template).parse().unwrap();
        Renderer::new(&context).render(&nodes).unwrap()
    }

    #[test]
    fn test_render_variable_escaped() {
        assert_eq!(
            render("Hi {{name}}", json!({"name": "<b>Tom & \"Jerry\"</b>"})),
            "Hi &lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_render_raw_variable() {
        assert_eq!(
            render("{{{body}}}", json!({"body": "<p>ok</p>"})),
            "<p>ok</p>"
        );
    }

    #[test]
    fn test_render_missing_variable_is_empty() {
        assert_eq!(render("[{{missing}}]", json!({})), "[]");
    }

    #[test]
    fn test_render_nested_path() {
        assert_eq!(
            render("{{user.name}}", json!({"user": {"name": "Bob"}})),
            "Bob"
        );
    }

    #[test]
    fn test_render_if_else() {
        let t = "{{#if user}}Hi {{user.name}}{{else}}Guest{{/if}}";
        assert_eq!(render(t, json!({"user": {"name": "Ann"}})), "Hi Ann");
        assert_eq!(render(t, json!({"user": null})), "Guest");
        assert_eq!(render(t, json!({})), "Guest");
    }

    #[test]
    fn test_render_unless() {
        assert_eq!(render("{{#unless n}}none{{/unless}}", json!({"n": 0})), "none");
        assert_eq!(render("{{#unless n}}none{{/unless}}", json!({"n": 3})), "");
    }

    #[test]
    fn test_render_each_with_loop_variables() {
        let t = "{{#each items}}{{@index}}:{{name}}{{#unless @last}},{{/unless}}{{/each}}";
        let data = json!({"items": [{"name": "a"}, {"name": "b"}, {"name": "c"}]});
        assert_eq!(render(t, data), "0:a,1:b,2:c");
    }

    #[test]
    fn test_render_each_as_and_this() {
        assert_eq!(
            render("{{#each tags}}[{{this}}]{{/each}}", json!({"tags": ["x", "y"]})),
            "[x][y]"
        );
        assert_eq!(
            render(
                "{{#each docs as d}}{{#if @first}}*{{/if}}{{d.name}} {{/each}}",
                json!({"docs": [{"name": "A"}, {"name": "B"}]})
            ),
            "*A B "
        );
    }

    #[test]
    fn test_render_each_empty_or_missing() {
        assert_eq!(render("{{#each xs}}x{{/each}}", json!({"xs": []})), "");
        assert_eq!(render("{{#each xs}}x{{/each}}", json!({})), "");
    }

    #[test]
    fn test_render_each_not_a_list() {
        let context = TemplateContext::from_json(json!({"xs": "nope"}));
        let nodes = Parser::new("{{#each xs}}x{{/each}}").parse().unwrap();
        assert!(matches!(
            Renderer::new(&context).render(&nodes),
            Err(TemplateError::Render(_))
        ));
    }

    #[test]
    fn test_render_with() {
        let t = "{{#with details}}{{hospital}} ({{this.location}}){{/with}}";
        assert_eq!(
            render(t, json!({"details": {"hospital": "General", "location": "Town"}})),
            "General (Town)"
        );
        assert_eq!(render(t, json!({"details": null})), "");
    }

    #[test]
    fn test_render_inner_scope_sees_outer_variables() {
        let t = "{{#each files}}{{owner}}/{{id}} {{/each}}";
        let data = json!({"owner": 7, "files": [{"id": 1}, {"id": 2}]});
        assert_eq!(render(t, data), "7/1 7/2 ");
    }
}
