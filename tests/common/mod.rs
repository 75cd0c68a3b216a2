use openapi_slicer::document::Document;
use serde_json::json;
use std::sync::Once;

static TRACING: Once = Once::new();

/// Route engine logs through the test writer when `RUST_LOG` is set.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A small OData-flavored source document exercising the shapes the engine
/// cares about: templated paths, bound actions and functions, `$ref`
/// navigations, nullable `anyOf` wrappers and multi-hop `$ref` chains.
pub fn sample_document() -> Document {
    serde_json::from_value(json!({
        "openapi": "3.0.1",
        "info": { "title": "Graph API", "version": "v1.0" },
        "paths": {
            "/": {
                "get": {
                    "operationId": "root_Get",
                    "tags": ["root"],
                    "responses": { "200": { "description": "service document" } }
                }
            },
            "/users": {
                "get": {
                    "operationId": "user_ListUser",
                    "tags": ["users.user"],
                    "parameters": [ { "$ref": "#/components/parameters/top" } ],
                    "responses": {
                        "200": {
                            "description": "retrieved collection",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/microsoft.graph.userCollectionResponse" }
                                }
                            }
                        },
                        "default": { "$ref": "#/components/responses/error" }
                    }
                },
                "post": {
                    "operationId": "user_CreateUser",
                    "tags": ["users.user"],
                    "requestBody": { "$ref": "#/components/requestBodies/userBody" },
                    "responses": {
                        "201": {
                            "description": "created entity",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/microsoft.graph.user" }
                                }
                            }
                        },
                        "default": { "$ref": "#/components/responses/error" }
                    }
                }
            },
            "/users/{user-id}": {
                "get": {
                    "operationId": "user_GetUser",
                    "tags": ["users.user"],
                    "responses": {
                        "200": {
                            "description": "retrieved entity",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/microsoft.graph.user" }
                                }
                            }
                        },
                        "default": { "$ref": "#/components/responses/error" }
                    }
                },
                "patch": {
                    "operationId": "user_UpdateUser",
                    "tags": ["users.user"],
                    "requestBody": { "$ref": "#/components/requestBodies/userBody" },
                    "responses": { "204": { "description": "success" } }
                }
            },
            "/applications/{application-id}/logo": {
                "put": {
                    "operationId": "application_SetLogo",
                    "tags": ["applications.application"],
                    "requestBody": {
                        "content": {
                            "application/octet-stream": {
                                "schema": { "type": "string", "format": "binary" }
                            }
                        }
                    },
                    "responses": { "204": { "description": "success" } }
                }
            },
            "/applications/{application-id}/createdOnBehalfOf/$ref": {
                "get": {
                    "operationId": "application_GetRefCreatedOnBehalfOf",
                    "tags": ["applications.directoryObject"],
                    "responses": {
                        "200": {
                            "description": "retrieved navigation link",
                            "content": {
                                "application/json": { "schema": { "type": "string" } }
                            }
                        }
                    }
                }
            },
            "/administrativeUnits/{administrativeUnit-id}/microsoft.graph.restore": {
                "post": {
                    "operationId": "administrativeUnit_restore",
                    "tags": ["administrativeUnits.Actions"],
                    "x-ms-docs-operation-type": "action",
                    "responses": {
                        "200": {
                            "description": "restored object",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/microsoft.graph.directoryObject" }
                                }
                            }
                        }
                    }
                }
            },
            "/reports/microsoft.graph.getTeamsUserActivityCounts(period={period})": {
                "get": {
                    "operationId": "reports_getTeamsUserActivityCounts",
                    "tags": ["reports.Functions"],
                    "x-ms-docs-operation-type": "function",
                    "parameters": [
                        {
                            "name": "period",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string" }
                        }
                    ],
                    "responses": { "200": { "description": "report stream" } }
                }
            },
            "/reports/microsoft.graph.getTeamsUserActivityUserDetail(date={date})": {
                "get": {
                    "operationId": "reports_getTeamsUserActivityUserDetail",
                    "tags": ["reports.Functions"],
                    "x-ms-docs-operation-type": "function",
                    "parameters": [
                        {
                            "name": "date",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string" }
                        }
                    ],
                    "responses": { "200": { "description": "report stream" } }
                }
            },
            "/workbooks/{workbook-id}/visibleView": {
                "get": {
                    "operationId": "workbook_GetVisibleView",
                    "tags": ["workbooks.workbookRange"],
                    "responses": {
                        "200": {
                            "description": "visible view",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/microsoft.graph.workbookRangeView" }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "microsoft.graph.entity": {
                    "type": "object",
                    "properties": { "id": { "type": "string" } }
                },
                "microsoft.graph.directoryObject": {
                    "allOf": [
                        { "$ref": "#/components/schemas/microsoft.graph.entity" },
                        {
                            "type": "object",
                            "properties": {
                                "deletedDateTime": {
                                    "anyOf": [
                                        { "type": "string", "format": "date-time" },
                                        { "type": "object", "nullable": true }
                                    ]
                                }
                            }
                        }
                    ]
                },
                "microsoft.graph.user": {
                    "allOf": [
                        { "$ref": "#/components/schemas/microsoft.graph.directoryObject" },
                        {
                            "type": "object",
                            "properties": {
                                "displayName": {
                                    "anyOf": [
                                        { "type": "string" },
                                        { "type": "object", "nullable": true }
                                    ]
                                },
                                "jobTitle": { "type": "string", "nullable": true }
                            }
                        }
                    ]
                },
                "microsoft.graph.userCollectionResponse": {
                    "type": "object",
                    "properties": {
                        "value": {
                            "type": "array",
                            "items": { "$ref": "#/components/schemas/microsoft.graph.user" }
                        }
                    }
                },
                "microsoft.graph.workbookRangeView": {
                    "type": "object",
                    "properties": {
                        "cellAddresses": {
                            "type": "array",
                            "description": "Represents the cell addresses of the <#> placeholder grid."
                        }
                    }
                },
                "microsoft.graph.odataError": {
                    "type": "object",
                    "properties": { "code": { "type": "string" } }
                }
            },
            "parameters": {
                "top": {
                    "name": "$top",
                    "in": "query",
                    "schema": { "type": "integer", "minimum": 0 }
                }
            },
            "responses": {
                "error": {
                    "description": "error response",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/microsoft.graph.odataError" }
                        }
                    }
                }
            },
            "requestBodies": {
                "userBody": {
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/microsoft.graph.user" }
                        }
                    },
                    "required": true
                }
            }
        }
    }))
    .expect("sample document is well formed")
}
