use std::time::Duration;

use esp_idf_svc::http::client::{Configuration as HttpConfiguration, EspHttpConnection};
use esp_idf_svc::http::Method;
use esp_idf_svc::sys::{EspError, ESP_FAIL};

use openclaw_esp32s3::chat::{GatewayResponse, HttpTransport, TransportFailure};

/// Gateway transport over the ESP-IDF HTTP client, one connection per request.
///
/// With `use_tls` the connection is HTTPS WITHOUT server certificate verification
/// (see `sdkconfig.defaults`). Anyone on the network path can impersonate the
/// gateway and read the bearer token.
pub struct EspGatewayTransport {
    use_tls: bool,
}

impl EspGatewayTransport {
    pub fn new(use_tls: bool) -> Self {
        if use_tls {
            log::warn!("TLS enabled without certificate verification");
        }
        EspGatewayTransport { use_tls }
    }
}

fn failure(stage: &str, e: EspError) -> TransportFailure {
    TransportFailure::new(e.code(), format!("{}: {}", stage, e))
}

impl HttpTransport for EspGatewayTransport {
    fn post(
        &mut self,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
        timeout: Duration,
    ) -> Result<GatewayResponse, TransportFailure> {
        let config = HttpConfiguration {
            timeout: Some(timeout),
            use_global_ca_store: false,
            crt_bundle_attach: None,
            skip_cert_common_name_check: self.use_tls,
            ..Default::default()
        };

        let mut client = EspHttpConnection::new(&config).map_err(|e| {
            log::error!("Failed to create HTTP client: {}", e);
            failure("client init", e)
        })?;

        let content_length = body.len().to_string();
        let mut request_headers = headers.to_vec();
        request_headers.push(("Content-Length", content_length.as_str()));

        log::info!("Initiating HTTP request to {}", url);
        client
            .initiate_request(Method::Post, url, &request_headers)
            .map_err(|e| failure("connect", e))?;

        write_all(&mut client, body).map_err(|e| failure("write", e))?;

        client
            .initiate_response()
            .map_err(|e| failure("response", e))?;

        let status = client.status();
        let body = read_response_body(&mut client).map_err(|e| failure("read", e))?;

        Ok(GatewayResponse { status, body })
    }
}

fn write_all(client: &mut EspHttpConnection, mut data: &[u8]) -> Result<(), EspError> {
    while !data.is_empty() {
        let written = client.write(data)?;
        if written == 0 {
            return Err(EspError::from_infallible::<ESP_FAIL>());
        }
        data = &data[written..];
    }
    Ok(())
}

/// Helper function to read response body
fn read_response_body(client: &mut EspHttpConnection) -> Result<String, EspError> {
    let mut response_body = Vec::new();
    let mut buffer = [0u8; 1024];

    loop {
        let bytes_read = client.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        response_body.extend_from_slice(&buffer[..bytes_read]);
    }

    Ok(String::from_utf8_lossy(&response_body).into_owned())
}
