use crate::{errors::AuthError, log, parse_url};
use anyhow::{bail, Result};
use std::{
    collections::HashMap,
    io::prelude::*,
    net::{TcpListener, TcpStream},
};

fn handle_request(mut stream: TcpStream) -> Option<HashMap<String, String>> {
    let mut buffer = [0; 1000];
    let _ = stream.read(&mut buffer).ok()?;

    let request = match String::from_utf8(buffer.to_vec()) {
        Ok(r) => r,
        Err(e) => {
            error_res(format!("Invalid UTF-8 sequence: {}", e), stream);
            return None;
        }
    };

    let split: Vec<&str> = request.split_whitespace().collect();
    if split.len() < 2 {
        error_res("Malformed request".to_string(), stream);
        return None;
    }

    // Browsers also ask for things like /favicon.ico; anything without a
    // readable query is answered and waited out.
    let query = match parse_url::get_query(split[1]) {
        Ok(q) => q,
        Err(_) => {
            not_found_res(stream);
            return None;
        }
    };

    if let Some(err) = query.get("error") {
        error_res(format!("Authentication error: {}", err), stream);
        return Some(query);
    }

    if query.contains_key("code") {
        success_res(stream);
        return Some(query);
    }

    not_found_res(stream);
    None
}

/// Waits for a single OAuth redirect on `host:port` and returns its query
/// parameters. The listener lives only for this one authorization attempt
/// and is released as soon as the redirect arrives.
pub fn get_callback(host: &str, port: u16) -> Result<HashMap<String, String>> {
    let listener = match TcpListener::bind((host, port)) {
        Ok(l) => l,
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            return Err(AuthError::PortInUse(port).into());
        }
        Err(e) => bail!(
            "Unable to setup listener on {}:{} for getting authorization code.\nDetails: {}",
            host,
            port,
            e
        ),
    };

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                if let Some(query) = handle_request(stream) {
                    return Ok(query);
                }
            }
            Err(e) => log::warn(format!("Failed to accept connection: {}", e)),
        }
    }

    bail!("App was unable to get authorization code from Google API");
}

fn success_res(mut stream: TcpStream) {
    let contents = include_str!("success.html");
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n{}",
        contents
    );

    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn error_res(error_message: String, mut stream: TcpStream) {
    let response = format!(
        "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\n\r\n<h1>{}</h1><p>Please try again.</p>\n",
        error_message
    );

    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn not_found_res(mut stream: TcpStream) {
    let response = "HTTP/1.1 404 Not Found\r\nContent-Type: text/html\r\n\r\n<h1>Not Found</h1>\n";

    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::thread;

    fn free_port() -> u16 {
        let probe = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        probe.local_addr().unwrap().port()
    }

    #[test]
    fn captures_code_from_redirect() {
        let port = free_port();
        let handle = thread::spawn(move || get_callback("127.0.0.1", port));

        // Give the listener a moment to bind.
        thread::sleep(std::time::Duration::from_millis(100));

        let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        stream
            .write_all(b"GET /?code=abc123&scope=drive.file HTTP/1.1\r\n\r\n")
            .unwrap();
        let mut response = String::new();
        let _ = stream.read_to_string(&mut response);
        assert!(response.starts_with("HTTP/1.1 200 OK"));

        let query = handle.join().unwrap().unwrap();
        assert_eq!(query.get("code").unwrap(), "abc123");
    }

    #[test]
    fn captures_provider_error_with_400_response() {
        let port = free_port();
        let handle = thread::spawn(move || get_callback("127.0.0.1", port));

        thread::sleep(std::time::Duration::from_millis(100));

        let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        stream
            .write_all(b"GET /?error=access_denied HTTP/1.1\r\n\r\n")
            .unwrap();
        let mut response = String::new();
        let _ = stream.read_to_string(&mut response);
        assert!(response.starts_with("HTTP/1.1 400 Bad Request"));

        let query = handle.join().unwrap().unwrap();
        assert_eq!(query.get("error").unwrap(), "access_denied");
    }

    #[test]
    fn bound_port_fails_with_port_in_use() {
        let holder = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = holder.local_addr().unwrap().port();

        let err = get_callback("127.0.0.1", port).unwrap_err();
        match err.downcast_ref::<AuthError>() {
            Some(AuthError::PortInUse(p)) => assert_eq!(*p, port),
            other => panic!("expected PortInUse, got {:?}", other),
        }
    }
}
