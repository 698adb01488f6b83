use capability::CapabilityTemplate;
use document::{lookup, Decl, Field, File, ListLit, Node, Scalar, StructLit};
use serde_json::{json, Map, Value};
use tracing::trace;

use crate::{TemplateContext, Templates, TemplatingError, TemplatingResult};

const OUTPUT_FIELD: &str = "output";
const PARAMETER_FIELD: &str = "parameter";
const CONTEXT_FIELD: &str = "context";

/// Instantiates capability templates with bound parameters.
pub trait Evaluator {
    /// Produces the concrete document for `template`, or a schema violation.
    fn evaluate(
        &self,
        template: &CapabilityTemplate,
        parameters: &Map<String, Value>,
        context: &TemplateContext,
    ) -> TemplatingResult<Value>;
}

/// Evaluates templates written as documents with `!ref` references.
///
/// The scope seen by a template is its own body plus two structs: `parameter` holding the bound
/// values (declared but unbound parameters are absent) and `context` holding the
/// [`TemplateContext`]. String literals of the template body containing `{{ ... }}` are
/// interpolated against the same two structs before references are resolved, so bound values
/// reach the output as supplied. The `output` field of the evaluated scope is the result.
#[derive(Debug, Default)]
pub struct DocumentEvaluator {
    templates: Templates<'static>,
}

impl DocumentEvaluator {
    pub fn new() -> Self {
        Self {
            templates: Templates::new(),
        }
    }

    fn check_parameters(
        template: &CapabilityTemplate,
        parameters: &Map<String, Value>,
    ) -> TemplatingResult<()> {
        for (name, value) in parameters {
            let spec =
                template
                    .parameter(name)
                    .ok_or_else(|| TemplatingError::UnknownParameter {
                        capability: template.name.clone(),
                        parameter: name.clone(),
                    })?;

            if !spec.kind.accepts(value) {
                return Err(TemplatingError::InvalidParameter {
                    capability: template.name.clone(),
                    parameter: name.clone(),
                    expected: spec.kind,
                    found: type_name(value).to_string(),
                });
            }
        }

        Ok(())
    }

    fn scope(
        &self,
        template: &CapabilityTemplate,
        parameters: &Map<String, Value>,
        context: &TemplateContext,
    ) -> TemplatingResult<Node> {
        let data = json!({
            PARAMETER_FIELD: parameters,
            CONTEXT_FIELD: context.data,
        });

        let bound = template
            .parameters
            .iter()
            .map(|spec| match parameters.get(&spec.name) {
                Some(value) => Field::new(spec.name.as_str(), Node::from(value)),
                None => Field::absent(spec.name.as_str()),
            })
            .collect();

        let context = context
            .data
            .iter()
            .map(|(k, v)| Field::new(k.as_str(), Node::from(v)))
            .collect();

        let mut decls = vec![
            Decl::Field(Field::new(PARAMETER_FIELD, Node::Struct(StructLit::new(bound)))),
            Decl::Field(Field::new(CONTEXT_FIELD, Node::Struct(StructLit::new(context)))),
        ];
        for decl in &template.template.decls {
            decls.push(self.interpolate_decl(decl, &data)?);
        }

        Ok(Node::File(File {
            filename: template.template.filename.clone(),
            decls,
        }))
    }

    fn interpolate_decl(&self, decl: &Decl, data: &Value) -> TemplatingResult<Decl> {
        Ok(match decl {
            Decl::Field(field) => Decl::Field(Field {
                label: field.label.clone(),
                value: field
                    .value
                    .as_ref()
                    .map(|v| self.interpolate(v, data))
                    .transpose()?,
                doc: field.doc.clone(),
            }),
            Decl::Embed(node) => Decl::Embed(self.interpolate(node, data)?),
        })
    }

    /// Renders the string literals of a template body. References are left for the document
    /// evaluator.
    fn interpolate(&self, node: &Node, data: &Value) -> TemplatingResult<Node> {
        Ok(match node {
            Node::Scalar(Scalar::String(s)) if Templates::is_template(s) => {
                Node::Scalar(Scalar::String(self.templates.render_str(s, data)?))
            }
            Node::File(file) => Node::File(File {
                filename: file.filename.clone(),
                decls: file
                    .decls
                    .iter()
                    .map(|d| self.interpolate_decl(d, data))
                    .collect::<TemplatingResult<Vec<Decl>>>()?,
            }),
            Node::Struct(s) => Node::Struct(StructLit {
                elts: s
                    .elts
                    .iter()
                    .map(|d| self.interpolate_decl(d, data))
                    .collect::<TemplatingResult<Vec<Decl>>>()?,
            }),
            Node::List(list) => Node::List(ListLit {
                elts: list
                    .elts
                    .iter()
                    .map(|n| self.interpolate(n, data))
                    .collect::<TemplatingResult<Vec<Node>>>()?,
            }),
            other => other.clone(),
        })
    }
}

impl Evaluator for DocumentEvaluator {
    fn evaluate(
        &self,
        template: &CapabilityTemplate,
        parameters: &Map<String, Value>,
        context: &TemplateContext,
    ) -> TemplatingResult<Value> {
        Self::check_parameters(template, parameters)?;

        let scope = self.scope(template, parameters, context)?;
        let evaluated = document::evaluate(&scope)?;
        let output = lookup(&evaluated, &[OUTPUT_FIELD])
            .map_err(|_| TemplatingError::MissingOutput(template.name.clone()))?;
        trace!(capability = %template.name, "evaluated template output");

        Ok(output.to_json()?)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(n) if n.is_i64() => "int",
        Value::Number(_) => "int beyond i64",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use capability::CapabilityTemplate;
    use document::DocumentError;
    use serde_json::json;
    use test_case::test_case;

    use super::*;

    const WEBSERVICE: &str = r#"
name: webservice
kind: workload
parameters:
  - name: image
    type: string
    required: true
  - name: port
    type: int
    default: 80
  - name: cmd
    type: list
template:
  output:
    apiVersion: apps/v1
    kind: Deployment
    metadata:
      name: !ref context.name
    spec:
      selector:
        app: "{{ context.appName }}-{{ context.name }}"
      containers:
        - image: !ref parameter.image
          command: !ref parameter.cmd
          port: !ref parameter.port
"#;

    fn webservice() -> CapabilityTemplate {
        CapabilityTemplate::from_yaml_str(WEBSERVICE, None).unwrap()
    }

    fn bound(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn evaluates_output_with_parameters_and_context() {
        let evaluator = DocumentEvaluator::new();
        let context = TemplateContext::for_component("frontend", "myapp", "default");

        let output = evaluator
            .evaluate(
                &webservice(),
                &bound(json!({"image": "inanimate/echo-server", "port": 8080})),
                &context,
            )
            .unwrap();

        assert_eq!(
            output,
            json!({
                "apiVersion": "apps/v1",
                "kind": "Deployment",
                "metadata": {"name": "frontend"},
                "spec": {
                    "selector": {"app": "myapp-frontend"},
                    "containers": [{"image": "inanimate/echo-server", "port": 8080}]
                }
            })
        );
    }

    #[test]
    fn bound_strings_are_not_interpolated() {
        let evaluator = DocumentEvaluator::new();
        let context = TemplateContext::for_component("frontend", "myapp", "default");

        let output = evaluator
            .evaluate(
                &webservice(),
                &bound(json!({
                    "image": "{{ user_var }}",
                    "port": 8080,
                    "cmd": ["echo", "{{ context.appName }}"]
                })),
                &context,
            )
            .unwrap();

        assert_eq!(output["spec"]["selector"], json!({"app": "myapp-frontend"}));
        assert_eq!(
            output["spec"]["containers"][0],
            json!({"image": "{{ user_var }}", "command": ["echo", "{{ context.appName }}"], "port": 8080})
        );
    }

    #[test]
    fn reference_into_unbound_object_parameter_is_dropped() {
        let template = CapabilityTemplate::from_yaml_str(
            "name: env\nkind: trait\nparameters:\n  - name: env\n    type: object\ntemplate:\n  output:\n    name: !ref context.name\n    port: !ref parameter.env.PORT\n",
            None,
        )
        .unwrap();
        let context = TemplateContext::for_component("frontend", "myapp", "default");

        let output = DocumentEvaluator::new()
            .evaluate(&template, &Map::new(), &context)
            .unwrap();

        assert_eq!(output, json!({"name": "frontend"}));
    }

    #[test_case(json!({"image": 42}) => matches Err(TemplatingError::InvalidParameter { .. }); "wrong type")]
    #[test_case(json!({"image": "a", "replicas": 2}) => matches Err(TemplatingError::UnknownParameter { .. }); "undeclared parameter")]
    fn rejects_schema_violations(parameters: Value) -> TemplatingResult<Value> {
        DocumentEvaluator::new().evaluate(&webservice(), &bound(parameters), &TemplateContext::new())
    }

    #[test]
    fn int_beyond_i64_is_rejected() {
        let result = DocumentEvaluator::new().evaluate(
            &webservice(),
            &bound(json!({"image": "a", "port": u64::MAX})),
            &TemplateContext::new(),
        );

        assert!(matches!(
            result,
            Err(TemplatingError::InvalidParameter { found, .. }) if found == "int beyond i64"
        ));
    }

    #[test]
    fn template_without_output_is_an_error() {
        let template = CapabilityTemplate::from_yaml_str(
            "name: empty\nkind: trait\ntemplate:\n  patch: {}\n",
            None,
        )
        .unwrap();

        let result = DocumentEvaluator::new().evaluate(&template, &Map::new(), &TemplateContext::new());

        assert!(matches!(result, Err(TemplatingError::MissingOutput(name)) if name == "empty"));
    }

    #[test]
    fn cyclic_template_is_an_error() {
        let template = CapabilityTemplate::from_yaml_str(
            "name: loop\nkind: trait\ntemplate:\n  output:\n    a: !ref output.b\n    b: !ref output.a\n",
            None,
        )
        .unwrap();

        let result = DocumentEvaluator::new().evaluate(&template, &Map::new(), &TemplateContext::new());

        assert!(matches!(
            result,
            Err(TemplatingError::Document(DocumentError::Cycle(_)))
        ));
    }
}
