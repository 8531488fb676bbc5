use crate::catalog::product::{Badge, Product};
use crate::page::page_model::{NativeAction, NodeId, Page, PageNode};
use crate::page::stylesheet::css_property_name;
use crate::site::settings::{FilterButton, SiteContent};

pub const GALLERY_ID: &str = "gallery";
pub const TRAINERS_ID: &str = "trainers";
pub const MODAL_ID: &str = "modal";
pub const DEFAULT_MAX_CARDS: usize = 50;

const VOID_TAGS: [&str; 4] = ["img", "input", "br", "hr"];

/// Handles to the page regions that get regenerated after the first render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    pub hero: NodeId,
    pub trainers: NodeId,
    pub filters: NodeId,
    pub gallery: NodeId,
}

// ============================================================================
// Static page skeleton
// ============================================================================

/// Build the home page: hero, trainers section with filter buttons, an empty
/// gallery and the (closed) modal mount point.
pub fn render_home(content: &SiteContent) -> (Page, PageLayout) {
    let mut page = Page::new();
    let body = page.root();

    let hero = append(&mut page, body, PageNode::new("section").with_class("hero"));
    append(
        &mut page,
        hero,
        PageNode::new("h1")
            .with_class("hero__title")
            .with_content(&escape_html(&content.hero_title)),
    );
    append(
        &mut page,
        hero,
        PageNode::new("p")
            .with_class("hero__subtitle")
            .with_content(&escape_html(&content.hero_subtitle)),
    );
    append(
        &mut page,
        hero,
        PageNode::new("button")
            .with_class("hero__button")
            .with_content(&escape_html(&content.hero_button))
            .with_action(NativeAction::ScrollToTrainers),
    );

    let trainers = append(
        &mut page,
        body,
        PageNode::new("section")
            .with_id(TRAINERS_ID)
            .with_class("trainers-section"),
    );
    append(
        &mut page,
        trainers,
        PageNode::new("h2")
            .with_class("trainers-title")
            .with_content(&escape_html(&content.section_title)),
    );
    append(
        &mut page,
        trainers,
        PageNode::new("p")
            .with_class("trainers-subtitle")
            .with_content(&escape_html(&content.section_subtitle)),
    );

    let filters = append(
        &mut page,
        trainers,
        PageNode::new("div").with_class("trainers-filters"),
    );
    let first_filter = content.filters.first().map(|f| f.filter.clone());
    render_filters(
        &mut page,
        filters,
        &content.filters,
        first_filter.as_deref().unwrap_or("all"),
    );

    let gallery = append(
        &mut page,
        trainers,
        PageNode::new("div").with_id(GALLERY_ID).with_class("gallery"),
    );

    append(
        &mut page,
        body,
        PageNode::new("div").with_id(MODAL_ID).with_class("modal"),
    );

    let layout = PageLayout {
        hero,
        trainers,
        filters,
        gallery,
    };
    (page, layout)
}

fn append(page: &mut Page, parent: NodeId, node: PageNode) -> NodeId {
    // Parents passed here were created a moment earlier in the same render.
    page.append(parent, node).unwrap_or(parent)
}

/// Replace the filter buttons, marking `active` as the selected filter.
pub fn render_filters(page: &mut Page, container: NodeId, filters: &[FilterButton], active: &str) {
    page.clear_children(container);

    for f in filters {
        let mut button = PageNode::new("button")
            .with_class("filter-btn")
            .with_attr("data-filter", &f.filter)
            .with_content(&escape_html(&f.text))
            .with_action(NativeAction::Filter {
                filter: f.filter.clone(),
            });
        if f.filter == active {
            button = button.with_class("filter-btn--active");
        }
        if let Some(color) = &f.color {
            button = button.with_style("backgroundColor", color);
        }
        if let Some(text_color) = &f.text_color {
            button = button.with_style("color", text_color);
        }
        page.append(container, button);
    }
}

/// Mark the filter button for `active` and unmark the others.
pub fn mark_active_filter(page: &mut Page, container: NodeId, active: &str) {
    let buttons: Vec<NodeId> = page
        .get(container)
        .map(|n| n.children().to_vec())
        .unwrap_or_default();

    for button in buttons {
        if page.attr(button, "data-filter") == Some(active) {
            page.add_class(button, "filter-btn--active");
        } else {
            page.remove_class(button, "filter-btn--active");
        }
    }
}

// ============================================================================
// Gallery
// ============================================================================

/// Clear the gallery and render up to `max_cards` cards. Every call creates
/// fresh elements; handles from a previous render stop resolving.
///
/// Returns the number of cards rendered.
pub fn render_gallery(
    page: &mut Page,
    gallery: NodeId,
    products: &[&Product],
    max_cards: usize,
) -> usize {
    page.clear_children(gallery);

    let to_render = &products[..products.len().min(max_cards)];
    if to_render.is_empty() {
        render_message(page, gallery, "No products available");
        return 0;
    }

    to_render
        .iter()
        .filter(|p| render_card(page, gallery, p).is_some())
        .count()
}

/// Replace the gallery content with an error paragraph.
pub fn render_message(page: &mut Page, gallery: NodeId, message: &str) {
    page.clear_children(gallery);
    page.append(
        gallery,
        PageNode::new("p")
            .with_class("error-message")
            .with_content(&escape_html(message)),
    );
}

pub fn render_card(page: &mut Page, parent: NodeId, product: &Product) -> Option<NodeId> {
    let card = page.append(
        parent,
        PageNode::new("div")
            .with_class("card")
            .with_attr("data-product-id", &product.id)
            .with_attr("tabindex", "0")
            .with_attr("role", "button")
            .with_attr("aria-label", &format!("View details for {}", product.title))
            .with_action(NativeAction::OpenDetails {
                product_id: product.id.clone(),
            }),
    )?;

    let image_wrapper = page.append(card, PageNode::new("div").with_class("card__image-wrapper"))?;
    let badges = page.append(image_wrapper, PageNode::new("div").with_class("card__badges"))?;

    for category in product.categories() {
        page.append(
            badges,
            PageNode::new("span")
                .with_class("card__badge")
                .with_content(&escape_html(&category)),
        );
    }
    if let Some(experience) = &product.experience {
        page.append(
            badges,
            PageNode::new("span")
                .with_class("card__badge card__badge--dark")
                .with_content(&escape_html(experience)),
        );
    }
    for badge in &product.badges {
        page.append(badges, badge_node(badge));
    }

    let alt = product.image_alt.as_deref().unwrap_or(&product.title);
    page.append(
        image_wrapper,
        PageNode::new("img")
            .with_class("card__image")
            .with_attr("src", &product.image)
            .with_attr("alt", alt)
            .with_attr("loading", "lazy"),
    );

    let content = page.append(card, PageNode::new("div").with_class("card__content"))?;
    page.append(
        content,
        PageNode::new("h3")
            .with_class("card__title")
            .with_content(&escape_html(&product.title)),
    );
    page.append(
        content,
        PageNode::new("p")
            .with_class("card__description")
            .with_content(&escape_html(&product.description)),
    );

    let actions = page.append(content, PageNode::new("div").with_class("card__actions"))?;
    // No action of its own: the click reaches the card and opens the details.
    page.append(
        actions,
        PageNode::new("button")
            .with_class("card__button card__button--primary")
            .with_content("More about the trainer <span class=\"button-icon\">\u{2197}</span>"),
    );
    page.append(
        actions,
        PageNode::new("button")
            .with_class("card__button card__button--secondary")
            .with_content("Book a consultation")
            .with_action(NativeAction::ContactPopup),
    );

    Some(card)
}

fn badge_node(badge: &Badge) -> PageNode {
    let mut node = PageNode::new("span")
        .with_class("card__badge")
        .with_content(&escape_html(badge.text()));

    if let Badge::Styled {
        dark,
        color,
        text_color,
        ..
    } = badge
    {
        if *dark {
            node = node.with_class("card__badge--dark");
        }
        if let Some(color) = color {
            node = node
                .with_style("backgroundColor", color)
                .with_style("color", text_color.as_deref().unwrap_or("#1a1a1a"));
        }
    }
    node
}

// ============================================================================
// HTML serialization
// ============================================================================

/// Serialize the page as a standalone HTML document.
pub fn to_html(page: &Page, title: &str) -> String {
    let mut body = String::new();
    if let Some(root) = page.get(page.root()) {
        for child in root.children() {
            write_node(page, *child, 1, &mut body);
        }
    }

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<link rel="stylesheet" href="css/style.css">
</head>
<body>
{body}</body>
</html>
"##,
        title = escape_html(title),
        body = body,
    )
}

/// Serialize one element and its subtree.
pub fn element_html(page: &Page, id: NodeId) -> String {
    let mut out = String::new();
    write_node(page, id, 0, &mut out);
    out
}

fn write_node(page: &Page, id: NodeId, depth: usize, out: &mut String) {
    let Some(node) = page.get(id) else {
        return;
    };
    let indent = "  ".repeat(depth);

    out.push_str(&indent);
    out.push('<');
    out.push_str(&node.tag);
    if let Some(html_id) = &node.id {
        out.push_str(&format!(" id=\"{}\"", escape_html(html_id)));
    }
    if !node.classes.is_empty() {
        out.push_str(&format!(" class=\"{}\"", escape_html(&node.classes.join(" "))));
    }
    for (name, value) in &node.attrs {
        out.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
    }
    if !node.style.is_empty() {
        let style = node
            .style
            .iter()
            .map(|(p, v)| format!("{}: {}", css_property_name(p), v))
            .collect::<Vec<_>>()
            .join("; ");
        out.push_str(&format!(" style=\"{}\"", escape_html(&style)));
    }
    out.push('>');

    if VOID_TAGS.contains(&node.tag.as_str()) {
        out.push('\n');
        return;
    }

    if node.children().is_empty() {
        out.push_str(&node.content);
    } else {
        out.push('\n');
        for child in node.children() {
            write_node(page, *child, depth + 1, out);
        }
        out.push_str(&indent);
    }

    out.push_str(&format!("</{}>\n", node.tag));
}

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
