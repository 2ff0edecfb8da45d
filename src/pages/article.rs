//! Article pages: search fields, list columns and form definition.

use super::{ColumnSpec, FieldKind, FieldSpec, PageDef};
use crate::menu::{ARTICLE_OPTION_ROUTE, ARTICLE_ROUTE};

pub static ARTICLE_PAGE: PageDef = PageDef {
    title: "文章管理",
    permission_prefix: "/content/article",
    list_route: ARTICLE_ROUTE,
    option_route: ARTICLE_OPTION_ROUTE,
    nav_prefix: &["内容管理", "文章管理"],
    search_fields: &[
        FieldSpec {
            name: "title",
            label: "标题",
            kind: FieldKind::Input,
            required: false,
        },
        FieldSpec {
            name: "author",
            label: "作者",
            kind: FieldKind::Input,
            required: false,
        },
    ],
    columns: &[
        ColumnSpec {
            title: "ID",
            data_index: "id",
            width: 8,
        },
        ColumnSpec {
            title: "标题",
            data_index: "title",
            width: 30,
        },
        ColumnSpec {
            title: "作者",
            data_index: "author",
            width: 12,
        },
        ColumnSpec {
            title: "创建时间",
            data_index: "createdAt",
            width: 20,
        },
    ],
    form_fields: &[
        FieldSpec {
            name: "title",
            label: "标题",
            kind: FieldKind::Input,
            required: true,
        },
        FieldSpec {
            name: "author",
            label: "作者",
            kind: FieldKind::Input,
            required: false,
        },
        FieldSpec {
            name: "synopsis",
            label: "简介",
            kind: FieldKind::TextArea,
            required: false,
        },
        FieldSpec {
            name: "content",
            label: "内容",
            kind: FieldKind::Editor,
            required: true,
        },
    ],
    create_template: &[("content", "<h4>初始化内容</h4>")],
    default_page_size: 20,
};
