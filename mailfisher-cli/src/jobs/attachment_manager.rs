use anyhow::{Context, Result};
use regex::Regex;
use shared_types::{MessageAttachment, RawMessage};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn month_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{1,2})-(\d{4})\b").expect("invalid month-year regex"))
}

/// "PaySlip_2020-8.pdf" when the subject names a month ("8-2020"), otherwise the
/// message id followed by the attachment's own name
pub fn attachment_filename(message: &RawMessage, attachment: &MessageAttachment, index: usize) -> String {
    let base = match month_year_re().captures(&message.subject) {
        Some(caps) => format!("PaySlip_{}-{}", &caps[2], &caps[1]),
        None => {
            let stem = Path::new(&attachment.filename)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "attachment".to_string());
            format!("{}_{}", message.id, stem)
        }
    };

    if index == 0 {
        format!("{}.pdf", base)
    } else {
        format!("{}_{}.pdf", base, index)
    }
}

/// Writes every PDF attachment into `output_dir`. A file that cannot be written
/// is logged and skipped.
pub fn save_pdf_attachments(messages: &[RawMessage], output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    let mut saved = Vec::new();
    for message in messages {
        for (index, attachment) in message.pdf_attachments().enumerate() {
            let path = output_dir.join(attachment_filename(message, attachment, index));
            match std::fs::write(&path, &attachment.content) {
                Ok(()) => {
                    tracing::info!(
                        "Saved attachment {:?} of message {} to {:?}",
                        attachment.filename,
                        message.id,
                        path
                    );
                    saved.push(path);
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to save attachment {:?} of message {}: {}",
                        attachment.filename,
                        message.id,
                        e
                    );
                }
            }
        }
    }

    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str) -> MessageAttachment {
        MessageAttachment {
            filename: name.to_string(),
            content_type: "application/pdf".to_string(),
            content: b"%PDF-1.4\n".to_vec(),
        }
    }

    #[test]
    fn test_filename_from_subject_month() {
        let message = RawMessage::new(
            "m1",
            "Please note that the Payslip for the income earned in 8-2020 is attached.",
            "",
        );
        assert_eq!(
            attachment_filename(&message, &pdf("recibo.pdf"), 0),
            "PaySlip_2020-8.pdf"
        );
        assert_eq!(
            attachment_filename(&message, &pdf("anexo.pdf"), 1),
            "PaySlip_2020-8_1.pdf"
        );
    }

    #[test]
    fn test_filename_without_month() {
        let message = RawMessage::new("m2", "Extrato mensal", "");
        assert_eq!(
            attachment_filename(&message, &pdf("extrato.pdf"), 0),
            "m2_extrato.pdf"
        );
    }

    #[test]
    fn test_save_only_pdfs() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("attachments");

        let mut message = RawMessage::new("m2", "Extrato mensal", "");
        message.attachments = vec![
            pdf("extrato.pdf"),
            MessageAttachment {
                filename: "logo.png".to_string(),
                content_type: "image/png".to_string(),
                content: vec![0x89, 0x50],
            },
        ];

        let saved = save_pdf_attachments(&[message], &output).unwrap();

        assert_eq!(saved, vec![output.join("m2_extrato.pdf")]);
        assert_eq!(std::fs::read(&saved[0]).unwrap(), b"%PDF-1.4\n");
    }
}
