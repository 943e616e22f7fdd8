//! WPS 1.0.0 envelopes: `Execute` requests, process outputs and exception
//! reports.
//!
//! Inputs and outputs are matched on local tag names, so the `wps:`/`ows:`
//! prefixes the server chooses do not matter.

use std::collections::BTreeMap;

use url::form_urlencoded;

use crate::expr::{Expr, Node};

use super::error::ProtocolError;
use super::fields::{as_node, leaf_text, required};

pub const WPS_NAMESPACE: &str = "http://www.opengis.net/wps/1.0.0";
pub const OWS_NAMESPACE: &str = "http://www.opengis.net/ows/1.1";

/// Decoded process outputs keyed by identifier.
pub type Outputs = BTreeMap<String, Expr>;

/// The processes the routing service exposes through `Execute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    PluginList,
    ConstantList,
    GetOptionDescriptions,
    GetOptions,
    SetOptions,
    Select,
    State,
    Connect,
    PreBuild,
    Build,
}

impl Operation {
    pub const ALL: [Operation; 10] = [
        Operation::PluginList,
        Operation::ConstantList,
        Operation::GetOptionDescriptions,
        Operation::GetOptions,
        Operation::SetOptions,
        Operation::Select,
        Operation::State,
        Operation::Connect,
        Operation::PreBuild,
        Operation::Build,
    ];

    /// The process identifier on the wire.
    pub fn identifier(self) -> &'static str {
        match self {
            Operation::PluginList => "plugin_list",
            Operation::ConstantList => "constant_list",
            Operation::GetOptionDescriptions => "get_option_descriptions",
            Operation::GetOptions => "get_options",
            Operation::SetOptions => "set_options",
            Operation::Select => "select",
            Operation::State => "state",
            Operation::Connect => "connect",
            Operation::PreBuild => "pre_build",
            Operation::Build => "build",
        }
    }

    pub fn from_identifier(identifier: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.identifier() == identifier)
    }
}

/// A named input of an `Execute` request.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteInput {
    /// A plain value, sent as `LiteralData`
    Literal(String),
    /// An XML tree, sent as `ComplexData`
    Complex(Expr),
}

/// Query string for `GetCapabilities`.
pub fn capabilities_query() -> String {
    query("GetCapabilities").finish()
}

/// Query string for `DescribeProcess`. The identifier is percent-encoded.
pub fn describe_process_query(identifier: &str) -> String {
    query("DescribeProcess")
        .append_pair("identifier", identifier)
        .finish()
}

fn query(request: &str) -> form_urlencoded::Serializer<'static, String> {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer
        .append_pair("service", "wps")
        .append_pair("version", "1.0.0")
        .append_pair("request", request);
    serializer
}

/// Wrap named inputs into a `wps:Execute` request for `identifier`.
///
/// Inputs are written in the given order.
pub fn execute_envelope(identifier: &str, inputs: &[(String, ExecuteInput)]) -> Expr {
    let mut data_inputs = Node::new("DataInputs");
    for (name, input) in inputs {
        let data = match input {
            ExecuteInput::Literal(value) => Node::new("LiteralData").with_text(value.as_str()),
            ExecuteInput::Complex(expr) => Node::new("ComplexData")
                .with_attr("mimeType", "text/xml")
                .with_attr("encoding", "UTF-8")
                .with_child(expr.clone()),
        };
        data_inputs.push(
            Node::new("Input")
                .with_child(Node::new("Identifier").with_text(name.as_str()))
                .with_child(Node::new("Data").with_child(data)),
        );
    }

    Node::new("wps:Execute")
        .with_attr("xmlns:wps", WPS_NAMESPACE)
        .with_attr("xmlns:ows", OWS_NAMESPACE)
        .with_attr("service", "WPS")
        .with_attr("version", "1.0.0")
        .with_child(Node::new("ows:Identifier").with_text(identifier))
        .with_child(data_inputs)
        .with_child(Node::new("ResponseForm").with_child(Node::new("RawDataOutput")))
        .into()
}

/// Recover the process identifier and inputs from an `Execute` request.
pub fn parse_execute_envelope(
    expr: &Expr,
) -> Result<(String, Vec<(String, ExecuteInput)>), ProtocolError> {
    let node = as_node(expr, "Execute")?;
    if node.local_name() != "Execute" {
        return Err(ProtocolError::unexpected("document", &node.tag));
    }

    let identifier = node
        .find("Identifier")
        .ok_or_else(|| ProtocolError::missing(&node.tag, "Identifier"))?;
    let identifier = leaf_text(identifier)?.trim().to_string();

    let mut inputs = Vec::new();
    if let Some(data_inputs) = node.find("DataInputs") {
        for input in data_inputs.nodes() {
            let name = input
                .find("Identifier")
                .ok_or_else(|| ProtocolError::missing(&input.tag, "Identifier"))?;
            let data = input
                .find("Data")
                .and_then(|data| data.nodes().next())
                .ok_or_else(|| ProtocolError::missing(&input.tag, "Data"))?;
            inputs.push((leaf_text(name)?.trim().to_string(), data_payload(data)?));
        }
    }
    Ok((identifier, inputs))
}

fn data_payload(data: &Node) -> Result<ExecuteInput, ProtocolError> {
    match data.local_name() {
        "LiteralData" => Ok(ExecuteInput::Literal(
            data.text().unwrap_or_default().to_string(),
        )),
        "ComplexData" => {
            let payload = data
                .nodes()
                .next()
                .cloned()
                .map(Expr::Node)
                .unwrap_or_else(|| Expr::Text(data.text().unwrap_or_default().to_string()));
            Ok(ExecuteInput::Complex(payload))
        }
        _ => Err(ProtocolError::unexpected("Data", &data.tag)),
    }
}

/// Collect the `ProcessOutputs` of an `ExecuteResponse`.
///
/// Complex outputs map to their XML payload, literal ones to their text.
pub fn parse_outputs(expr: &Expr) -> Result<Outputs, ProtocolError> {
    let node = as_node(expr, "ExecuteResponse")?;
    let outputs = node
        .find("ProcessOutputs")
        .ok_or_else(|| ProtocolError::missing(&node.tag, "ProcessOutputs"))?;

    let mut result = Outputs::new();
    for output in outputs.nodes() {
        let identifier = output
            .find("Identifier")
            .ok_or_else(|| ProtocolError::missing(&output.tag, "Identifier"))?;
        let data = output
            .find("Data")
            .and_then(|data| data.nodes().next())
            .ok_or_else(|| ProtocolError::missing(&output.tag, "Data"))?;

        let payload = match data_payload(data)? {
            ExecuteInput::Literal(text) => Expr::Text(text),
            ExecuteInput::Complex(expr) => expr,
        };
        result.insert(leaf_text(identifier)?.trim().to_string(), payload);
    }
    Ok(result)
}

/// A decoded `ows:ExceptionReport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionReport {
    pub code: String,
    pub message: String,
}

/// Read an exception report, or `None` if `expr` is not one.
pub fn parse_exception_report(expr: &Expr) -> Option<ExceptionReport> {
    let node = expr.as_node()?;
    if node.local_name() != "ExceptionReport" {
        return None;
    }
    let exception = node.find("Exception")?;
    let code = required(exception, "exceptionCode").ok()?.to_string();
    let message = exception
        .find("ExceptionText")
        .and_then(Node::text)
        .unwrap_or_default()
        .to_string();
    Some(ExceptionReport { code, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{decode, encode};

    #[test]
    fn operation_identifiers_round_trip() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_identifier(op.identifier()), Some(op));
        }
        assert_eq!(Operation::from_identifier("pre_process"), None);
    }

    #[test]
    fn queries() {
        assert_eq!(
            capabilities_query(),
            "service=wps&version=1.0.0&request=GetCapabilities"
        );
        assert_eq!(
            describe_process_query("select"),
            "service=wps&version=1.0.0&request=DescribeProcess&identifier=select"
        );
        assert_eq!(
            describe_process_query("a&b=c d"),
            "service=wps&version=1.0.0&request=DescribeProcess&identifier=a%26b%3Dc+d"
        );
    }

    #[test]
    fn envelope_layout() {
        let plugin: Expr = Node::new("plugin").with_attr("name", "p").into();
        let expr = execute_envelope(
            "select",
            &[
                ("plugin".into(), ExecuteInput::Complex(plugin.clone())),
                ("db_options".into(), ExecuteInput::Literal("dbname=x".into())),
            ],
        );
        let node = expr.as_node().unwrap();
        assert_eq!(node.tag, "wps:Execute");
        assert_eq!(node.attr("service"), Some("WPS"));
        assert_eq!(node.attr("xmlns:ows"), Some(OWS_NAMESPACE));
        assert_eq!(node.find("Identifier").unwrap().text(), Some("select"));

        let inputs: Vec<&Node> = node.find("DataInputs").unwrap().nodes().collect();
        assert_eq!(inputs.len(), 2);
        let complex = inputs[0].find("Data").unwrap().find("ComplexData").unwrap();
        assert_eq!(complex.attr("mimeType"), Some("text/xml"));
        assert_eq!(complex.children, vec![plugin]);
        let literal = inputs[1].find("Data").unwrap().find("LiteralData").unwrap();
        assert_eq!(literal.text(), Some("dbname=x"));

        assert!(node.find("ResponseForm").unwrap().find("RawDataOutput").is_some());
    }

    #[test]
    fn envelope_parses_back() {
        let plugin: Expr = Node::new("plugin").with_attr("name", "p").into();
        let inputs = vec![
            ("plugin".to_string(), ExecuteInput::Complex(plugin)),
            ("db_options".to_string(), ExecuteInput::Literal("dbname=x".into())),
        ];
        let xml = encode(&execute_envelope("select", &inputs));
        let (identifier, parsed) = parse_execute_envelope(&decode(&xml).unwrap()).unwrap();
        assert_eq!(identifier, "select");
        assert_eq!(parsed, inputs);
    }

    #[test]
    fn envelope_rejects_other_documents() {
        let expr = decode("<select/>").unwrap();
        assert!(matches!(
            parse_execute_envelope(&expr),
            Err(ProtocolError::UnexpectedTag { .. })
        ));
    }

    #[test]
    fn outputs_by_identifier() {
        let xml = r#"<wps:ExecuteResponse xmlns:wps="http://www.opengis.net/wps/1.0.0" xmlns:ows="http://www.opengis.net/ows/1.1">
          <wps:Process><ows:Identifier>state</ows:Identifier></wps:Process>
          <wps:Status><wps:ProcessSucceeded/></wps:Status>
          <wps:ProcessOutputs>
            <wps:Output>
              <ows:Identifier>state</ows:Identifier>
              <ows:Title>Server state</ows:Title>
              <wps:Data><wps:ComplexData><state>3</state></wps:ComplexData></wps:Data>
            </wps:Output>
            <wps:Output>
              <ows:Identifier>label</ows:Identifier>
              <wps:Data><wps:LiteralData>ready</wps:LiteralData></wps:Data>
            </wps:Output>
          </wps:ProcessOutputs>
        </wps:ExecuteResponse>"#;
        let outputs = parse_outputs(&decode(xml).unwrap()).unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs["state"].as_node().unwrap().text(), Some("3"));
        assert_eq!(outputs["label"], Expr::Text("ready".into()));
    }

    #[test]
    fn outputs_require_process_outputs() {
        let expr = decode("<wps:ExecuteResponse/>").unwrap();
        assert!(matches!(
            parse_outputs(&expr),
            Err(ProtocolError::MissingField { .. })
        ));
    }

    #[test]
    fn exception_report() {
        let xml = r#"<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/1.1" version="1.0.0">
<ows:Exception exceptionCode="InvalidParameterValue"><ows:ExceptionText>Unknown plugin &lt;x&gt;</ows:ExceptionText></ows:Exception>
</ows:ExceptionReport>"#;
        let report = parse_exception_report(&decode(xml).unwrap()).unwrap();
        assert_eq!(report.code, "InvalidParameterValue");
        assert_eq!(report.message, "Unknown plugin <x>");

        assert!(parse_exception_report(&decode("<results/>").unwrap()).is_none());
    }
}
