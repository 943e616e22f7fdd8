//! Routing-service client.
//!
//! Wraps every server operation in a typed method: requests are encoded,
//! sent over a [`Transport`], and answers decoded into domain types. The
//! client keeps the plugin catalog of its session so option sets can be
//! checked before they are sent.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::domain::{
    Itinerary, OptionDescriptor, OptionValues, PluginDescriptor, PluginRegistry, Request,
    TransportMode, TransportNetwork,
};
use crate::expr::{Expr, decode, encode};
use crate::protocol::{
    ExecuteInput, Operation, Outputs, ProtocolError, SelectRecord, ServerState, build_options,
    build_plugin, build_request, capabilities_query, describe_process_query, encode_record,
    execute_envelope, parse_exception_report, parse_execute_envelope, parse_metrics,
    parse_option_descriptions, parse_outputs, parse_plugin_options, parse_plugins, parse_results,
    parse_transport_modes, parse_transport_networks,
};

use super::error::ClientError;
use super::transport::{Method, Transport};

/// Decoded answer of a `select` call, with the exchange kept for history.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOutcome {
    /// Itineraries in server order; empty when nothing was found
    pub results: Vec<Itinerary>,
    pub metrics: BTreeMap<String, String>,
    pub record: SelectRecord,
}

impl SelectOutcome {
    /// The history payload for this exchange.
    pub fn to_record_xml(&self, server_state: Option<&ServerState>) -> String {
        encode_record(&self.record, server_state)
    }
}

/// Raw catalog answers, kept for server-state snapshots.
#[derive(Debug, Clone, Default)]
struct Catalogs {
    plugins: Option<Expr>,
    transport_modes: Option<Expr>,
    transport_networks: Option<Expr>,
}

/// Client for one routing server.
///
/// Strictly sequential: each call blocks until the whole answer is read.
/// If a call is abandoned at the transport level, treat the session as
/// unknown and re-read the catalogs.
#[derive(Debug)]
pub struct TempusClient<T: Transport> {
    transport: T,
    plugins: PluginRegistry,
    catalogs: Catalogs,
}

impl<T: Transport> TempusClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            plugins: PluginRegistry::new(),
            catalogs: Catalogs::default(),
        }
    }

    /// Create a client and check that the server answers `GetCapabilities`.
    pub fn open(transport: T) -> Result<Self, ClientError> {
        let mut client = Self::new(transport);
        client.get_capabilities()?;
        Ok(client)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Plugins from the last `plugin_list` call.
    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn get_capabilities(&mut self) -> Result<Expr, ClientError> {
        self.exchange("GetCapabilities", Method::Get, &capabilities_query())
    }

    pub fn describe_process(&mut self, identifier: &str) -> Result<Expr, ClientError> {
        self.exchange(
            "DescribeProcess",
            Method::Get,
            &describe_process_query(identifier),
        )
    }

    /// Run process `identifier` and collect its outputs.
    pub fn execute(
        &mut self,
        identifier: &str,
        inputs: &[(String, ExecuteInput)],
    ) -> Result<Outputs, ClientError> {
        let body = encode(&execute_envelope(identifier, inputs));
        let answer = self.exchange(identifier, Method::Post, &body)?;
        Ok(parse_outputs(&answer)?)
    }

    pub fn run(
        &mut self,
        operation: Operation,
        inputs: &[(String, ExecuteInput)],
    ) -> Result<Outputs, ClientError> {
        self.execute(operation.identifier(), inputs)
    }

    /// Send one request and decode the answer, turning exception reports
    /// into [`ClientError::ServerFault`].
    fn exchange(&mut self, operation: &str, method: Method, content: &str) -> Result<Expr, ClientError> {
        let response = self.transport.request(method, content)?;
        debug!(
            operation,
            status = response.status,
            bytes = response.body.len(),
            "Routing server answered"
        );

        if response.status != 200 {
            return match decode(&response.body).ok().as_ref().and_then(parse_exception_report) {
                Some(report) => {
                    warn!(
                        operation,
                        status = response.status,
                        code = %report.code,
                        "Server returned an exception report"
                    );
                    Err(ClientError::ServerFault {
                        code: report.code,
                        message: report.message,
                    })
                }
                None => Err(ClientError::transport_failure(response.status, &response.body)),
            };
        }

        let answer = decode(&response.body)?;
        if let Some(report) = parse_exception_report(&answer) {
            return Err(ClientError::ServerFault {
                code: report.code,
                message: report.message,
            });
        }
        Ok(answer)
    }

    /// List the server's plugins and refresh the session registry.
    pub fn plugin_list(&mut self) -> Result<Vec<PluginDescriptor>, ClientError> {
        let mut outputs = self.run(Operation::PluginList, &[])?;
        let answer = take_output(&mut outputs, "plugins")?;
        let plugins = parse_plugins(&answer)?;

        self.plugins = PluginRegistry::from_plugins(plugins.iter().cloned());
        self.catalogs.plugins = Some(answer);
        debug!(count = plugins.len(), "Loaded plugin catalog");
        Ok(plugins)
    }

    /// Transport modes and networks known to the server.
    pub fn constant_list(
        &mut self,
    ) -> Result<(Vec<TransportMode>, Vec<TransportNetwork>), ClientError> {
        let mut outputs = self.run(Operation::ConstantList, &[])?;
        let modes = take_output(&mut outputs, "transport_modes")?;
        let networks = take_output(&mut outputs, "transport_networks")?;

        let parsed = (
            parse_transport_modes(&modes)?,
            parse_transport_networks(&networks)?,
        );
        self.catalogs.transport_modes = Some(modes);
        self.catalogs.transport_networks = Some(networks);
        Ok(parsed)
    }

    pub fn get_option_descriptions(
        &mut self,
        plugin: &str,
    ) -> Result<BTreeMap<String, OptionDescriptor>, ClientError> {
        let mut outputs = self.run(Operation::GetOptionDescriptions, &[plugin_input(plugin)])?;
        Ok(parse_option_descriptions(&take_output(&mut outputs, "options")?)?)
    }

    /// Current option values of `plugin`.
    pub fn get_options(&mut self, plugin: &str) -> Result<OptionValues, ClientError> {
        let mut outputs = self.run(Operation::GetOptions, &[plugin_input(plugin)])?;
        Ok(parse_plugin_options(&take_output(&mut outputs, "options")?)?)
    }

    pub fn set_options(&mut self, plugin: &str, options: &OptionValues) -> Result<(), ClientError> {
        self.check_options(plugin, options)?;
        let inputs = [
            plugin_input(plugin),
            (
                "options".to_string(),
                ExecuteInput::Complex(build_options(options).into()),
            ),
        ];
        self.run(Operation::SetOptions, &inputs)?;
        Ok(())
    }

    /// Plan a trip with `plugin`.
    ///
    /// An empty result list is a valid answer, distinct from a decoding
    /// failure.
    pub fn select(
        &mut self,
        plugin: &str,
        request: &Request,
        options: &OptionValues,
    ) -> Result<SelectOutcome, ClientError> {
        self.check_options(plugin, options)?;
        let bundle = build_request(request, plugin, options)?;

        // The bundle children are the process inputs, named by their tags.
        let inputs: Vec<(String, ExecuteInput)> = bundle
            .as_node()
            .map(|node| {
                node.nodes()
                    .map(|child| (child.tag.clone(), ExecuteInput::Complex(child.clone().into())))
                    .collect()
            })
            .unwrap_or_default();

        let mut outputs = self.run(Operation::Select, &inputs)?;
        let (results, metrics) = select_outputs(&mut outputs)?;
        let record = SelectRecord::from_bundle(&bundle, results.0, metrics.0)?;
        debug!(plugin, results = results.1.len(), "Trip planned");

        Ok(SelectOutcome {
            results: results.1,
            metrics: metrics.1,
            record,
        })
    }

    /// Re-send a stored `select` Execute document as is.
    pub fn replay(&mut self, raw_execute: &str) -> Result<SelectOutcome, ClientError> {
        let (identifier, inputs) = parse_execute_envelope(&decode(raw_execute)?)?;
        if Operation::from_identifier(&identifier) != Some(Operation::Select) {
            return Err(ProtocolError::UnexpectedTag {
                context: "replay".to_string(),
                found: identifier,
            }
            .into());
        }

        let answer = self.exchange(&identifier, Method::Post, raw_execute)?;
        let mut outputs = parse_outputs(&answer)?;
        let (results, metrics) = select_outputs(&mut outputs)?;

        let mut sent = BTreeMap::new();
        for (name, input) in inputs {
            if let ExecuteInput::Complex(expr) = input {
                sent.insert(name, expr);
            }
        }
        let mut sent_input =
            |name: &str| sent.remove(name).ok_or_else(|| ProtocolError::missing("select", name));

        let record = SelectRecord {
            plugin: sent_input("plugin")?,
            request: sent_input("request")?,
            options: sent_input("options")?,
            results: results.0,
            metrics: metrics.0,
        };
        Ok(SelectOutcome {
            results: results.1,
            metrics: metrics.1,
            record,
        })
    }

    /// The server's state code (0 when nothing is loaded yet).
    pub fn state(&mut self) -> Result<u32, ClientError> {
        let mut outputs = self.run(Operation::State, &[])?;
        let answer = take_output(&mut outputs, "state")?;
        let text = match &answer {
            Expr::Text(text) => Some(text.as_str()),
            Expr::Node(node) => node.text(),
        };
        text.and_then(|t| t.trim().parse().ok()).ok_or_else(|| {
            ProtocolError::InvalidValue {
                element: "state".to_string(),
                field: "text".to_string(),
                value: text.unwrap_or_default().to_string(),
            }
            .into()
        })
    }

    /// Connect the server to its database.
    pub fn connect(&mut self, db_options: &str) -> Result<(), ClientError> {
        let inputs = [(
            "db_options".to_string(),
            ExecuteInput::Literal(db_options.to_string()),
        )];
        self.run(Operation::Connect, &inputs)?;
        Ok(())
    }

    pub fn pre_build(&mut self) -> Result<(), ClientError> {
        self.run(Operation::PreBuild, &[])?;
        Ok(())
    }

    pub fn build(&mut self) -> Result<(), ClientError> {
        self.run(Operation::Build, &[])?;
        Ok(())
    }

    /// Snapshot of the catalogs for a history record, fetching whichever
    /// has not been read in this session.
    pub fn server_state(&mut self) -> Result<ServerState, ClientError> {
        if self.catalogs.plugins.is_none() {
            self.plugin_list()?;
        }
        if self.catalogs.transport_modes.is_none() || self.catalogs.transport_networks.is_none() {
            self.constant_list()?;
        }

        let catalog = |expr: &Option<Expr>, name: &str| {
            expr.clone()
                .ok_or_else(|| ClientError::MissingOutput(name.to_string()))
        };
        Ok(ServerState {
            plugins: catalog(&self.catalogs.plugins, "plugins")?,
            transport_modes: catalog(&self.catalogs.transport_modes, "transport_modes")?,
            transport_networks: catalog(&self.catalogs.transport_networks, "transport_networks")?,
        })
    }

    /// Options are only checked once the plugin catalog has been read.
    fn check_options(&self, plugin: &str, options: &OptionValues) -> Result<(), ClientError> {
        if self.plugins.is_empty() {
            return Ok(());
        }
        Ok(self.plugins.validate_options(plugin, options)?)
    }
}

fn plugin_input(plugin: &str) -> (String, ExecuteInput) {
    (
        "plugin".to_string(),
        ExecuteInput::Complex(build_plugin(plugin).into()),
    )
}

fn take_output(outputs: &mut Outputs, name: &str) -> Result<Expr, ClientError> {
    outputs
        .remove(name)
        .ok_or_else(|| ClientError::MissingOutput(name.to_string()))
}

type Decoded<V> = (Expr, V);

fn select_outputs(
    outputs: &mut Outputs,
) -> Result<(Decoded<Vec<Itinerary>>, Decoded<BTreeMap<String, String>>), ClientError> {
    let results = take_output(outputs, "results")?;
    let metrics = take_output(outputs, "metrics")?;
    let parsed_results = parse_results(&results)?;
    let parsed_metrics = parse_metrics(&metrics)?;
    Ok(((results, parsed_results), (metrics, parsed_metrics)))
}
