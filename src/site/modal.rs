use tracing::debug;

use crate::catalog::product::{Product, format_price};
use crate::page::page_model::{NodeId, Page, PageNode};
use crate::page::render::escape_html;
use crate::site::settings::SiteContent;

pub const MODAL_OPEN_CLASS: &str = "modal--open";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSlide {
    Image(String),
    Video(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactOption {
    pub label: String,
    pub href: String,
}

/// Detail view for one trainer, with a wrap-around media carousel.
#[derive(Debug, Clone, Default)]
pub struct DetailModal {
    product_id: Option<String>,
    slides: Vec<MediaSlide>,
    current: usize,
    contacts: Vec<ContactOption>,
}

impl DetailModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.product_id.is_some()
    }

    pub fn product_id(&self) -> Option<&str> {
        self.product_id.as_deref()
    }

    /// Open for `product` and render into the modal mount point.
    pub fn open(&mut self, page: &mut Page, mount: NodeId, product: &Product, content: &SiteContent) {
        self.slides = media_slides(product, content);
        self.current = 0;
        self.contacts = contact_options(product.phone.as_deref().unwrap_or(&content.contact_phone));
        self.product_id = Some(product.id.clone());

        render_modal(page, mount, product, self);
        debug!("Opened details for {}", product.id);
    }

    pub fn close(&mut self, page: &mut Page, mount: NodeId) {
        if self.product_id.take().is_none() {
            return;
        }
        self.slides.clear();
        self.contacts.clear();
        self.current = 0;
        page.clear_children(mount);
        page.remove_class(mount, MODAL_OPEN_CLASS);
    }

    pub fn slides(&self) -> &[MediaSlide] {
        &self.slides
    }

    pub fn current_slide(&self) -> Option<&MediaSlide> {
        self.slides.get(self.current)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn next(&mut self) -> Option<&MediaSlide> {
        if !self.slides.is_empty() {
            self.current = (self.current + 1) % self.slides.len();
        }
        self.current_slide()
    }

    pub fn prev(&mut self) -> Option<&MediaSlide> {
        if !self.slides.is_empty() {
            self.current = (self.current + self.slides.len() - 1) % self.slides.len();
        }
        self.current_slide()
    }

    /// Jump to a slide; out-of-range indices wrap like the arrows do.
    pub fn show(&mut self, index: isize) -> Option<&MediaSlide> {
        if !self.slides.is_empty() {
            self.current = index.rem_euclid(self.slides.len() as isize) as usize;
        }
        self.current_slide()
    }

    pub fn contacts(&self) -> &[ContactOption] {
        &self.contacts
    }
}

/// Images (or the single cover image), then one video slide: the trainer's
/// own video, else the global one when enabled.
pub fn media_slides(product: &Product, content: &SiteContent) -> Vec<MediaSlide> {
    let mut slides: Vec<MediaSlide> = if !product.images.is_empty() {
        product.images.iter().cloned().map(MediaSlide::Image).collect()
    } else if !product.image.is_empty() {
        vec![MediaSlide::Image(product.image.clone())]
    } else {
        vec![]
    };

    let personal = product.videos.iter().find(|v| !v.is_empty());
    let video = match personal {
        Some(v) => Some(v.clone()),
        None if content.global_video_enabled => content.global_video.clone(),
        None => None,
    };
    if let Some(video) = video {
        slides.push(MediaSlide::Video(video));
    }
    slides
}

pub fn contact_options(phone: &str) -> Vec<ContactOption> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    vec![
        ContactOption {
            label: "Call".to_string(),
            href: format!("tel:+{}", digits),
        },
        ContactOption {
            label: "WhatsApp".to_string(),
            href: format!(
                "https://wa.me/{}?text=Hello%21%20I%27d%20like%20to%20book%20a%20personal%20training%20session",
                digits
            ),
        },
        ContactOption {
            label: "Telegram".to_string(),
            href: format!("https://t.me/+{}", digits),
        },
    ]
}

fn render_modal(page: &mut Page, mount: NodeId, product: &Product, modal: &DetailModal) {
    page.clear_children(mount);
    page.add_class(mount, MODAL_OPEN_CLASS);

    let Some(body) = page.append(mount, PageNode::new("div").with_class("modal__body")) else {
        return;
    };

    page.append(
        body,
        PageNode::new("h2")
            .with_class("modal__title")
            .with_content(&escape_html(&product.title)),
    );
    if let Some(price) = product.price {
        page.append(
            body,
            PageNode::new("p")
                .with_class("modal__price")
                .with_content(&escape_html(&format_price(price, product.currency.as_deref()))),
        );
    }

    let description = product
        .detailed_description
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or(&product.description);
    page.append(
        body,
        PageNode::new("p")
            .with_class("modal__description")
            .with_content(&escape_html(description)),
    );

    if let Some(MediaSlide::Image(src)) = modal.current_slide() {
        page.append(
            body,
            PageNode::new("img")
                .with_class("modal__image modal__image--main")
                .with_attr("src", src)
                .with_attr("alt", product.image_alt.as_deref().unwrap_or(&product.title)),
        );
    }

    if let Some(actions) = page.append(body, PageNode::new("div").with_class("modal__actions")) {
        for contact in &modal.contacts {
            page.append(
                actions,
                PageNode::new("a")
                    .with_class("modal__contact-option")
                    .with_attr("href", &contact.href)
                    .with_content(&escape_html(&contact.label)),
            );
        }
    }
}
