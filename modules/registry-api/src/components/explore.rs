use dioxus::prelude::*;

use super::layout::Layout;
use super::ExploreView;
use crate::templates::render_document;

#[allow(non_snake_case)]
#[component]
fn ExplorePage(view: ExploreView) -> Element {
    let company_name = view.company_name.clone();
    let total = view.total;
    let noun = if total == 1 { "statement" } else { "statements" };
    let page = view.page;
    let total_pages = view.total_pages;

    rsx! {
        Layout { title: "Explore statements".to_string(),
            div { class: "flex items-end justify-between gap-4 mb-4",
                form { method: "get", action: "/explore", class: "flex gap-2",
                    input {
                        r#type: "text",
                        name: "company_name",
                        value: "{company_name}",
                        placeholder: "Company name",
                        class: "border border-gray-300 rounded px-3 py-1.5 text-sm",
                    }
                    select { name: "industries", multiple: true, "aria-label": "Industries",
                        class: "border border-gray-300 rounded px-2 py-1 text-sm",
                        for opt in view.industries.iter() {
                            option { value: "{opt.id}", selected: opt.selected, "{opt.name}" }
                        }
                    }
                    select { name: "countries", multiple: true, "aria-label": "Countries",
                        class: "border border-gray-300 rounded px-2 py-1 text-sm",
                        for opt in view.countries.iter() {
                            option { value: "{opt.id}", selected: opt.selected, "{opt.name}" }
                        }
                    }
                    button { r#type: "submit",
                        class: "px-4 py-1.5 bg-gray-900 text-white rounded text-sm",
                        "Search"
                    }
                }
                a { href: "{view.download_href}", id: "download-csv",
                    class: "text-sm text-blue-600 hover:text-blue-800",
                    "Download CSV"
                }
            }
            p { class: "text-sm text-gray-500 mb-3", "{total} {noun}" }
            if view.rows.is_empty() {
                p { class: "text-gray-400 text-center py-10", "No statements match these filters." }
            } else {
                table { class: "w-full bg-white border border-gray-200 text-sm",
                    thead {
                        tr { class: "text-left text-gray-500 border-b border-gray-200",
                            th { class: "p-2", "Company" }
                            th { class: "p-2", "Sector" }
                            th { class: "p-2", "HQ" }
                            th { class: "p-2", "Date Added" }
                            th { class: "p-2", "Statement" }
                        }
                    }
                    tbody {
                        for row in view.rows.iter() {
                            tr { class: "border-b border-gray-100",
                                td { class: "p-2 font-medium", "{row.company_name}" }
                                td { class: "p-2", "{row.sector}" }
                                td { class: "p-2", "{row.country}" }
                                td { class: "p-2 whitespace-nowrap", "{row.date_seen}" }
                                td { class: "p-2",
                                    a { href: "{row.url}", target: "_blank", rel: "noopener",
                                        class: "text-blue-600 hover:text-blue-800",
                                        "View"
                                    }
                                    if view.admin && row.broken_url {
                                        span { class: "ml-2 text-xs text-red-700", "Broken link" }
                                    }
                                    if view.admin && !row.published {
                                        span { class: "ml-2 text-xs text-amber-700", "Unpublished" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
            nav { class: "flex gap-4 items-center justify-center text-sm mt-4",
                {
                    view.previous_href.as_ref().map(|href| rsx! {
                        a { href: "{href}", rel: "prev", class: "text-blue-600", "Previous" }
                    })
                }
                span { class: "text-gray-500", "Page {page} of {total_pages}" }
                {
                    view.next_href.as_ref().map(|href| rsx! {
                        a { href: "{href}", rel: "next", class: "text-blue-600", "Next" }
                    })
                }
            }
        }
    }
}

pub fn render_explore(view: ExploreView) -> String {
    let mut dom = VirtualDom::new_with_props(ExplorePage, ExplorePageProps { view });
    dom.rebuild_in_place();
    render_document(&dom)
}
