use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

use stompws_client::Stomp;
use stompws_frame::{Frame, Headers};

use crate::cmd::session::Session;
use crate::cmd::SendArgs;
use crate::exit::{client_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let body = resolve_body(&args)?;
    let mut headers: Headers = args.headers.iter().cloned().collect();
    let receipt_id = args
        .receipt
        .then(|| format!("send-{}", std::process::id()));
    if let Some(id) = &receipt_id {
        headers.insert("receipt", id.as_str());
    }

    let mut session = Session::open(&args.connect)?;

    let receipt: Rc<RefCell<Option<Frame>>> = Rc::new(RefCell::new(None));
    if let Some(id) = receipt_id.clone() {
        let slot = Rc::clone(&receipt);
        session.client.on_receipt(move |frame, _| {
            if frame.headers.get("receipt-id") == Some(id.as_str()) {
                *slot.borrow_mut() = Some(frame.clone());
            }
        });
    }

    session
        .client
        .send(&args.destination, &body, &headers)
        .map_err(|err| client_error("send failed", err))?;

    if receipt_id.is_some() {
        let slot = Rc::clone(&receipt);
        session.wait_for("RECEIPT", move |_| slot.borrow().is_some())?;
        if let Some(frame) = receipt.borrow().as_ref() {
            print_frame(frame, format);
        }
    }

    session.close()?;
    Ok(SUCCESS)
}

fn resolve_body(args: &SendArgs) -> CliResult<String> {
    if let Some(data) = &args.data {
        return Ok(data.clone());
    }
    if let Some(path) = &args.file {
        let bytes = fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
        return String::from_utf8(bytes).map_err(|_| {
            CliError::new(
                DATA_INVALID,
                format!("{} is not valid UTF-8", path.display()),
            )
        });
    }
    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use stompws_client::Heartbeat;

    use super::*;
    use crate::cmd::ConnectArgs;

    fn args(data: Option<&str>, file: Option<PathBuf>) -> SendArgs {
        SendArgs {
            connect: ConnectArgs {
                addr: "127.0.0.1:61613".to_string(),
                login: None,
                passcode: None,
                vhost: None,
                stomp_version: "1.2".to_string(),
                heartbeat: Heartbeat::disabled(),
                binary: false,
                timeout: "1s".to_string(),
            },
            destination: "/queue/a".to_string(),
            data: data.map(str::to_string),
            file,
            headers: Vec::new(),
            receipt: false,
        }
    }

    #[test]
    fn body_defaults_to_empty() {
        assert_eq!(resolve_body(&args(None, None)).unwrap(), "");
        assert_eq!(resolve_body(&args(Some("hi"), None)).unwrap(), "hi");
    }

    #[test]
    fn file_body_must_be_utf8() {
        let path = std::env::temp_dir().join(format!("stompws-body-{}.bin", std::process::id()));
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        let err = resolve_body(&args(None, Some(path.clone()))).unwrap_err();
        let _ = fs::remove_file(&path);
        assert_eq!(err.code, DATA_INVALID);
    }
}
