#![forbid(unsafe_code)]

//! HTML pages served to the embedded browser during the add-card flow.

use crate::router::AddFlowVariant;

pub const COMPLETE_ADD_PATH: &str = "/paymentmethods/completeadd";
pub const CANCELLED_PATH: &str = "/click/cancelled";
pub const SUCCEEDED_PATH: &str = "/click/succeeded";
/// Text the prompt page expects before it proceeds.
pub const PROMPT_PASSPHRASE: &str = "friend";

pub const INTERACTION_SUCCESS: &str = r#"<html>
    <body bgcolor="green" onClick="window.location.assign('/paymentmethods/completeadd')">
        <h1>Placeholder for web interaction</h1>
        <p>Click anywhere to proceed</p>
    </body>
</html>
"#;

pub const INTERACTION_CANCEL: &str = r#"<html>
    <body bgcolor="red" onClick="window.location.assign('/api/2.0/click/cancelled')">
        <h1>Placeholder for web interaction</h1>
        <p>Click anywhere to cancel</p>
    </body>
</html>
"#;

pub const ADD_COMPLETED: &str = r#"<html>
    <body onLoad="window.location.assign('/click/succeeded')">
    </body>
</html>
"#;

pub const ADD_BEFOREUNLOAD: &str = r#"<html>
    <script language="javascript">
        window.onbeforeunload = function() {
            return 'Really want to add your card?'
        }
        window.onload = function() {
            window.location.assign('/click/cancelled')
        }
        window.onclick = function() {
            window.onbeforeunload = null;
            window.location.assign('/paymentmethods/completeadd')
        }
    </script>
    <body bgcolor="yellow">
        <h1>Placeholder for web interaction</h1>
        <p>Click 'Stay' and then anywhere to proceed.</p>
    </body>
</html>
"#;

pub const ADD_ALERT: &str = r#"<html>
    <body onClick="window.location.assign('/paymentmethods/completeadd')"
          onLoad="alert('Click OK to add your card.')">
        <h1>Placeholder for web interaction</h1>
        <p>Click anywhere to proceed</p>
    </body>
</html>
"#;

pub const ADD_CONFIRM: &str = r#"<html>
    <script language="javascript">
        window.onload = function() {
            if (window.confirm('Do you want to add your card?')) {
                window.location.assign('/paymentmethods/completeadd')
            } else {
                window.location.assign('/click/cancelled')
            }
        }
    </script>
    <body bgcolor="pink">
        <h1>Placeholder for web interaction</h1>
        <p>Click ok to add card, or cancel to not.</p>
    </body>
</html>
"#;

pub const ADD_PROMPT: &str = r#"<html>
    <script language="javascript">
        window.onload = function() {
            if (window.prompt('Speak friend and enter') == 'friend') {
                window.location.assign('/paymentmethods/completeadd')
            } else {
                window.location.assign('/click/cancelled')
            }
        }
    </script>
    <body bgcolor="pink">
        <h1>Placeholder for web interaction</h1>
        <p>Type friend and ok to add card.</p>
    </body>
</html>
"#;

pub fn interaction_page(cancelled: bool) -> &'static str {
    if cancelled {
        INTERACTION_CANCEL
    } else {
        INTERACTION_SUCCESS
    }
}

pub fn add_flow_page(variant: AddFlowVariant, cancelled: bool) -> &'static str {
    match variant {
        AddFlowVariant::Plain => interaction_page(cancelled),
        AddFlowVariant::Alert => ADD_ALERT,
        AddFlowVariant::BeforeUnload => ADD_BEFOREUNLOAD,
        AddFlowVariant::Confirm => ADD_CONFIRM,
        AddFlowVariant::Prompt => ADD_PROMPT,
    }
}
