// ABOUTME: HTTP server module for the slidesmith application
// ABOUTME: Exposes deck generation, generated-file downloads and the style listing over tiny_http

use crate::assembler::{Assembler, DeckRequest, DEFAULT_SLIDE_COUNT, MAX_SLIDE_COUNT};
use crate::errors::{DeckError, Result};
use crate::utils::is_served_filename;
use log::{debug, error, info};
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::io::Read;
use std::thread;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

const PPTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// Body of `POST /generate`
#[derive(Debug, Deserialize)]
struct GenerateBody {
    prompt: Option<String>,
    presenter: Option<String>,
    title: Option<String>,
    num_slides: Option<i64>,
    template_style: Option<String>,
    include_images: Option<bool>,
}

/// A response ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    pub attachment: Option<String>,
}

impl Reply {
    fn json(status: u16, value: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: value.to_string().into_bytes(),
            attachment: None,
        }
    }

    fn failure(status: u16, message: &str) -> Self {
        Self::json(status, json!({ "success": false, "error": message }))
    }
}

/// Serves deck generation over HTTP, one thread per request
pub struct DeckServer {
    assembler: Assembler,
    port: u16,
}

impl DeckServer {
    pub fn new(assembler: Assembler, port: u16) -> Self {
        Self { assembler, port }
    }

    /// Listen until the process exits
    pub fn run(&self) -> Result<()> {
        let server = Server::http(format!("0.0.0.0:{}", self.port))
            .map_err(|e| DeckError::Server(format!("Failed to start HTTP server: {}", e)))?;
        info!("HTTP server listening on http://localhost:{}", self.port);

        for request in server.incoming_requests() {
            let assembler = self.assembler.clone();
            thread::spawn(move || serve_request(request, &assembler));
        }
        Ok(())
    }
}

fn serve_request(mut request: Request, assembler: &Assembler) {
    let method = request.method().clone();
    let url = request.url().to_string();
    debug!("{} {}", method, url);

    let mut body = String::new();
    let reply = match request.as_reader().read_to_string(&mut body) {
        Ok(_) => handle(&method, &url, &body, assembler),
        Err(e) => Reply::failure(400, &format!("Unreadable request body: {}", e)),
    };

    let mut response = Response::from_data(reply.body).with_status_code(StatusCode(reply.status));
    if let Ok(header) = Header::from_bytes("Content-Type", reply.content_type) {
        response = response.with_header(header);
    }
    if let Some(name) = reply.attachment {
        let value = format!("attachment; filename=\"{}\"", name);
        if let Ok(header) = Header::from_bytes("Content-Disposition", value.as_bytes()) {
            response = response.with_header(header);
        }
    }
    if let Err(e) = request.respond(response) {
        error!("Failed to send response: {}", e);
    }
}

/// Route one request to its handler
pub fn handle(method: &Method, url: &str, body: &str, assembler: &Assembler) -> Reply {
    let path = url.split('?').next().unwrap_or("");
    match (method, path) {
        (Method::Post, "/generate") => generate(body, assembler),
        (Method::Get, "/styles") => styles(assembler),
        (Method::Get, p) if p.starts_with("/download/") => {
            download(&p["/download/".len()..], assembler)
        }
        _ => Reply::failure(404, "Not found"),
    }
}

fn generate(body: &str, assembler: &Assembler) -> Reply {
    let parsed: GenerateBody = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) => return Reply::failure(400, &format!("Invalid JSON body: {}", e)),
    };

    let prompt = parsed.prompt.unwrap_or_default();
    let presenter = parsed.presenter.unwrap_or_default();
    if prompt.trim().is_empty() || presenter.trim().is_empty() {
        return Reply::failure(400, "Both 'prompt' and 'presenter' are required");
    }

    let mut request = DeckRequest::new(&prompt, &presenter);
    request.title = parsed.title;
    request.template_style = parsed.template_style.unwrap_or_default();
    request.include_images = parsed.include_images.unwrap_or(false);
    request.slide_count = parsed
        .num_slides
        .unwrap_or(DEFAULT_SLIDE_COUNT as i64)
        .clamp(1, MAX_SLIDE_COUNT as i64) as usize;

    match assembler.generate(&request) {
        Ok(deck) => Reply::json(
            200,
            json!({
                "success": true,
                "filename": deck.filename,
                "file_url": format!("/download/{}", deck.filename),
            }),
        ),
        Err(e) => {
            error!("Generation failed: {}", e);
            Reply::failure(500, &e.to_string())
        }
    }
}

fn download(name: &str, assembler: &Assembler) -> Reply {
    if !is_served_filename(name) {
        return Reply::failure(404, "Not found");
    }
    match fs::read(assembler.output_dir().join(name)) {
        Ok(data) => Reply {
            status: 200,
            content_type: PPTX_CONTENT_TYPE,
            body: data,
            attachment: Some(name.to_string()),
        },
        Err(e) => {
            debug!("Download of {} failed: {}", name, e);
            Reply::failure(404, "Not found")
        }
    }
}

fn styles(assembler: &Assembler) -> Reply {
    Reply::json(
        200,
        json!({
            "styles": assembler.store().available_styles(),
            "default": assembler.store().default_style(),
        }),
    )
}
