use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::ApiError;
use crate::products::repo::ProductKind;

lazy_static! {
    static ref IMAGE_URL_RE: Regex =
        Regex::new(r"(?i)^https?://.*\.(png|jpg|jpeg|gif|svg|webp)$").unwrap();
    static ref PDF_URL_RE: Regex = Regex::new(r"(?i)^https?://.*\.pdf$").unwrap();
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub subject_name: String,
    pub subject_code: String,
    pub price: Decimal,
    pub image: String,
    pub description: String,
    pub kind: ProductKind,
    pub pdf_link: String,
}

/// Partial update; absent fields keep their current values.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub subject_name: Option<String>,
    pub subject_code: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub kind: Option<ProductKind>,
    pub pdf_link: Option<String>,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::validation("Product name is required"));
        }
        if self.subject_name.trim().is_empty() || self.subject_code.trim().is_empty() {
            return Err(ApiError::validation("Subject name and code are required"));
        }
        if self.description.trim().is_empty() {
            return Err(ApiError::validation("Description is required"));
        }
        check_price(&self.price)?;
        check_image(&self.image)?;
        check_pdf(&self.pdf_link)?;
        Ok(())
    }
}

impl UpdateProductRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if matches!(&self.name, Some(n) if n.trim().is_empty()) {
            return Err(ApiError::validation("Product name is required"));
        }
        if matches!(&self.subject_name, Some(s) if s.trim().is_empty())
            || matches!(&self.subject_code, Some(s) if s.trim().is_empty())
        {
            return Err(ApiError::validation("Subject name and code are required"));
        }
        if matches!(&self.description, Some(d) if d.trim().is_empty()) {
            return Err(ApiError::validation("Description is required"));
        }
        if let Some(price) = &self.price {
            check_price(price)?;
        }
        if let Some(image) = &self.image {
            check_image(image)?;
        }
        if let Some(pdf_link) = &self.pdf_link {
            check_pdf(pdf_link)?;
        }
        Ok(())
    }
}

fn check_price(price: &Decimal) -> Result<(), ApiError> {
    if price.is_sign_negative() {
        return Err(ApiError::validation("Price must be a positive number"));
    }
    Ok(())
}

fn check_image(url: &str) -> Result<(), ApiError> {
    if !IMAGE_URL_RE.is_match(url) {
        return Err(ApiError::validation("Please enter a valid image URL"));
    }
    Ok(())
}

fn check_pdf(url: &str) -> Result<(), ApiError> {
    if !PDF_URL_RE.is_match(url) {
        return Err(ApiError::validation("Please enter a valid PDF URL"));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn valid_request() -> CreateProductRequest {
        CreateProductRequest {
            name: "Calculus II Final".into(),
            subject_name: "Mathematics".into(),
            subject_code: "MATH-201".into(),
            price: Decimal::from_str("19.99").unwrap(),
            image: "https://cdn.example.com/calc.png".into(),
            description: "Past exam with solutions".into(),
            kind: ProductKind::Exam,
            pdf_link: "https://cdn.example.com/calc.pdf".into(),
        }
    }

    #[test]
    fn accepts_valid_product() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn rejects_negative_price() {
        let mut req = valid_request();
        req.price = Decimal::from_str("-0.01").unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_bad_image_and_pdf_urls() {
        let mut req = valid_request();
        req.image = "ftp://cdn.example.com/calc.png".into();
        assert!(req.validate().is_err());

        let mut req = valid_request();
        req.pdf_link = "https://cdn.example.com/calc.docx".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn partial_update_rejects_blank_text_fields() {
        let blank = UpdateProductRequest {
            name: Some("   ".into()),
            subject_name: Some("".into()),
            subject_code: None,
            price: None,
            image: None,
            description: Some("   ".into()),
            kind: None,
            pdf_link: None,
        };
        assert!(blank.validate().is_err());

        let blank_code = UpdateProductRequest {
            name: None,
            subject_name: None,
            subject_code: Some(" ".into()),
            price: None,
            image: None,
            description: None,
            kind: None,
            pdf_link: None,
        };
        assert!(blank_code.validate().is_err());
    }

    #[test]
    fn partial_update_checks_only_present_fields() {
        let req = UpdateProductRequest {
            name: Some("New name".into()),
            subject_name: None,
            subject_code: None,
            price: None,
            image: None,
            description: None,
            kind: None,
            pdf_link: None,
        };
        assert!(req.validate().is_ok());

        let req = UpdateProductRequest {
            price: Some(Decimal::from_str("-5").unwrap()),
            name: None,
            subject_name: None,
            subject_code: None,
            image: None,
            description: None,
            kind: None,
            pdf_link: None,
        };
        assert!(req.validate().is_err());
    }
}
