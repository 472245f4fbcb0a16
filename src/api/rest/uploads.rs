use crate::api::rest::forms::required_text;
use crate::db::models::item_models::ItemFields;
use crate::error::Error;
use crate::services::storage::extension_for_mime;
use axum::extract::multipart::{Field, Multipart};

pub const IMAGE_FIELD: &str = "image";
pub const QR_IMAGE_FIELD: &str = "qr_code_image";

/// File part of an item form, already checked for type and size
#[derive(Debug)]
pub struct UploadedFile {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

/// Multipart item form as received
#[derive(Debug, Default)]
pub struct ItemForm {
    pub name: Option<String>,
    pub quantity: Option<String>,
    pub code: Option<String>,
    pub brand: Option<String>,
    pub image: Option<UploadedFile>,
    pub qr_code_image: Option<UploadedFile>,
}

impl ItemForm {
    /// Required item attributes
    pub fn fields(&self) -> Result<ItemFields, Error> {
        let (Some(name), Some(quantity), Some(code), Some(brand)) = (
            required_text(&self.name),
            required_text(&self.quantity),
            required_text(&self.code),
            required_text(&self.brand),
        ) else {
            return Err(Error::Validation("All fields are required".to_string()));
        };

        let quantity = quantity
            .parse::<i32>()
            .ok()
            .filter(|q| *q >= 0)
            .ok_or_else(|| Error::Validation("Quantity must be a whole number".to_string()))?;

        Ok(ItemFields {
            name: name.to_string(),
            quantity,
            code: code.to_string(),
            brand: brand.to_string(),
        })
    }
}

/// Read every part of an item form. Files are read chunk by chunk and
/// rejected as soon as they pass `max_bytes`.
pub async fn read_item_form(multipart: &mut Multipart, max_bytes: usize) -> Result<ItemForm, Error> {
    let mut form = ItemForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("Malformed form data: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if field.file_name().is_some() || name == IMAGE_FIELD || name == QR_IMAGE_FIELD {
            let file = read_file(field, &name, max_bytes).await?;
            match name.as_str() {
                IMAGE_FIELD => form.image = Some(file),
                _ => form.qr_code_image = Some(file),
            }
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| Error::Validation(format!("Malformed form data: {}", e)))?;
        match name.as_str() {
            "name" => form.name = Some(text),
            "quantity" => form.quantity = Some(text),
            "code" => form.code = Some(text),
            "brand" => form.brand = Some(text),
            _ => {}
        }
    }

    Ok(form)
}

async fn read_file(mut field: Field<'_>, name: &str, max_bytes: usize) -> Result<UploadedFile, Error> {
    if name != IMAGE_FIELD && name != QR_IMAGE_FIELD {
        return Err(Error::Validation(format!("Unexpected file field: {}", name)));
    }

    let extension = field
        .content_type()
        .and_then(extension_for_mime)
        .ok_or_else(|| {
            Error::Validation("Only image files are allowed (jpeg, jpg, png, gif, webp)".to_string())
        })?;

    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| Error::Validation(format!("Failed to read upload: {}", e)))?
    {
        if bytes.len() + chunk.len() > max_bytes {
            return Err(Error::Validation(format!(
                "File too large (max {} bytes)",
                max_bytes
            )));
        }
        bytes.extend_from_slice(&chunk);
    }

    if bytes.is_empty() {
        return Err(Error::Validation(format!("Uploaded {} is empty", name)));
    }

    Ok(UploadedFile { extension, bytes })
}
