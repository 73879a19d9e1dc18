//! Localized message templates (English / Marathi).
//!
//! Templates use positional `{0}`, `{1}`, ... placeholders. Keys are a closed
//! enum so a missing template is a compile error, not a runtime fallback.

use crate::types::{Language, ReportType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKey {
    LanguagePrompt,
    NameRequest,
    /// {0} = name
    NameConfirmed,
    /// {0} = name
    WelcomeBack,
    Menu,
    /// {0} = category label, {1} = url, {2} = validity in minutes
    CaptureLink,
    /// {0} = url, {1} = validity in minutes
    JoinLink,
    /// {0} = category label
    PhotoPrompt,
    LocationHint,
    SuggestionPrompt,
    JoinPrompt,
    /// {0} = division name
    ReportAccepted,
    SuggestionReceived,
    /// {0} = applicant name
    JoinReceived,
    OutsideJurisdiction,
    /// {0} = division name
    NotificationFailed,
    MissingFields,
    SubmissionFailed,
    LinkUnavailable,
    /// {0} = category, {1} = division, {2} = reporter, {3} = description,
    /// {4} = address, {5} = lat, {6} = lng, {7} = photo url
    OfficerAlert,
}

/// Look up `key` in `language` and substitute positional arguments.
pub fn localized(key: TextKey, language: Language, args: &[&str]) -> String {
    fill(template(key, language), args)
}

/// Replace `{n}` placeholders in one pass over the template. Arguments are
/// inserted verbatim, so placeholder-like text inside an argument stays as is.
/// Placeholders without a matching argument are left untouched.
fn fill(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let arg = after.find('}').and_then(|close| {
            let index: usize = after[..close].parse().ok()?;
            args.get(index).map(|arg| (*arg, close))
        });
        match arg {
            Some((arg, close)) => {
                out.push_str(arg);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Human-readable category name used inside messages.
pub fn report_label(report_type: ReportType, language: Language) -> &'static str {
    match (report_type, language) {
        (ReportType::Accident, Language::En) => "accident",
        (ReportType::Accident, Language::Mr) => "अपघात",
        (ReportType::TrafficCongestion, Language::En) => "traffic congestion",
        (ReportType::TrafficCongestion, Language::Mr) => "वाहतूक कोंडी",
        (ReportType::IllegalParking, Language::En) => "illegal parking",
        (ReportType::IllegalParking, Language::Mr) => "बेकायदेशीर पार्किंग",
        (ReportType::SignalMalfunction, Language::En) => "signal malfunction",
        (ReportType::SignalMalfunction, Language::Mr) => "सिग्नल बिघाड",
        (ReportType::RoadDamage, Language::En) => "road damage",
        (ReportType::RoadDamage, Language::Mr) => "रस्त्याचे नुकसान",
        (ReportType::RashDriving, Language::En) => "rash driving",
        (ReportType::RashDriving, Language::Mr) => "बेदरकार वाहन चालवणे",
        (ReportType::Suggestion, Language::En) => "suggestion",
        (ReportType::Suggestion, Language::Mr) => "सूचना",
        (ReportType::JoinRequest, Language::En) => "team application",
        (ReportType::JoinRequest, Language::Mr) => "टीम अर्ज",
    }
}

fn template(key: TextKey, language: Language) -> &'static str {
    use Language::{En, Mr};
    use TextKey::*;

    match (key, language) {
        // Shown before a language is known, so both variants are bilingual.
        (LanguagePrompt, _) => {
            "Welcome to the Traffic Police WhatsApp helpline.\n\
             वाहतूक पोलीस व्हॉट्सअ‍ॅप हेल्पलाइनमध्ये आपले स्वागत आहे.\n\n\
             Please choose your language / कृपया तुमची भाषा निवडा:\n\
             1. English\n\
             2. मराठी"
        }

        (NameRequest, En) => "Please tell us your name.",
        (NameRequest, Mr) => "कृपया तुमचे नाव सांगा.",

        (NameConfirmed, En) => "Thank you, {0}!",
        (NameConfirmed, Mr) => "धन्यवाद, {0}!",

        (WelcomeBack, En) => "Welcome back, {0}!",
        (WelcomeBack, Mr) => "पुन्हा स्वागत आहे, {0}!",

        (Menu, En) => {
            "What would you like to report?\n\
             1. Accident\n\
             2. Traffic congestion\n\
             3. Illegal parking\n\
             4. Signal malfunction\n\
             5. Road damage\n\
             6. Rash driving\n\
             7. Suggestion\n\
             8. Join our volunteer team\n\n\
             Reply with a number. Send *menu* to see this list again or *reset* to start over."
        }
        (Menu, Mr) => {
            "तुम्हाला काय कळवायचे आहे?\n\
             1. अपघात\n\
             2. वाहतूक कोंडी\n\
             3. बेकायदेशीर पार्किंग\n\
             4. सिग्नल बिघाड\n\
             5. रस्त्याचे नुकसान\n\
             6. बेदरकार वाहन चालवणे\n\
             7. सूचना\n\
             8. आमच्या स्वयंसेवक टीममध्ये सामील व्हा\n\n\
             क्रमांक पाठवा. ही यादी पुन्हा पाहण्यासाठी *menu* आणि पुन्हा सुरू करण्यासाठी *reset* पाठवा."
        }

        (CaptureLink, En) => {
            "Please submit your {0} report using this link (valid for {2} minutes):\n{1}"
        }
        (CaptureLink, Mr) => {
            "कृपया या लिंकद्वारे तुमची {0} तक्रार नोंदवा ({2} मिनिटांसाठी वैध):\n{1}"
        }

        (JoinLink, En) => {
            "Thank you for your interest! Fill in the application here (valid for {1} minutes):\n{0}"
        }
        (JoinLink, Mr) => {
            "तुमच्या रुचीबद्दल धन्यवाद! अर्ज येथे भरा ({1} मिनिटांसाठी वैध):\n{0}"
        }

        (PhotoPrompt, En) => {
            "Please send a photo of the {0} with a short description as the caption."
        }
        (PhotoPrompt, Mr) => "कृपया {0} चा फोटो आणि त्यासोबत थोडक्यात वर्णन पाठवा.",

        (LocationHint, En) => "Please share your location using 📎 > Location.",
        (LocationHint, Mr) => "कृपया 📎 > Location वापरून तुमचे स्थान पाठवा.",

        (SuggestionPrompt, En) => "Please type your suggestion.",
        (SuggestionPrompt, Mr) => "कृपया तुमची सूचना लिहा.",

        (JoinPrompt, En) => {
            "Please reply in this format:\nName: ...\nEmail: ...\nPhone: ...\nLocation: ..."
        }
        (JoinPrompt, Mr) => {
            "कृपया या स्वरूपात उत्तर द्या:\nName: ...\nEmail: ...\nPhone: ...\nLocation: ..."
        }

        (ReportAccepted, En) => {
            "Your report has been registered and forwarded to the {0} division. \
             Thank you for helping keep our roads safe."
        }
        (ReportAccepted, Mr) => {
            "तुमची तक्रार नोंदवली गेली असून {0} विभागाकडे पाठवली आहे. \
             रस्ते सुरक्षित ठेवण्यास मदत केल्याबद्दल धन्यवाद."
        }

        (SuggestionReceived, En) => "Thank you! Your suggestion has been recorded.",
        (SuggestionReceived, Mr) => "धन्यवाद! तुमची सूचना नोंदवली गेली आहे.",

        (JoinReceived, En) => "Thank you, {0}! Your application to join the team has been received.",
        (JoinReceived, Mr) => "धन्यवाद, {0}! टीममध्ये सामील होण्याचा तुमचा अर्ज मिळाला आहे.",

        (OutsideJurisdiction, En) => {
            "Sorry, this location is outside our jurisdiction. We could not register your report."
        }
        (OutsideJurisdiction, Mr) => {
            "क्षमस्व, हे ठिकाण आमच्या कार्यक्षेत्राबाहेर आहे. तुमची तक्रार नोंदवता आली नाही."
        }

        (NotificationFailed, En) => {
            "Sorry, we could not reach the officers of the {0} division right now. \
             Please try again later, or call 112 in an emergency."
        }
        (NotificationFailed, Mr) => {
            "क्षमस्व, सध्या {0} विभागातील अधिकाऱ्यांशी संपर्क होऊ शकला नाही. \
             कृपया नंतर पुन्हा प्रयत्न करा किंवा आपत्कालीन परिस्थितीत 112 वर कॉल करा."
        }

        (MissingFields, En) => {
            "Some required details are missing. Please start again from the menu."
        }
        (MissingFields, Mr) => "काही आवश्यक माहिती अपूर्ण आहे. कृपया मेनूमधून पुन्हा सुरू करा.",

        (SubmissionFailed, En) => {
            "Sorry, something went wrong while registering your report. Please try again."
        }
        (SubmissionFailed, Mr) => {
            "क्षमस्व, तुमची तक्रार नोंदवताना अडचण आली. कृपया पुन्हा प्रयत्न करा."
        }

        (LinkUnavailable, En) => {
            "Sorry, we could not create your link right now. Please try again."
        }
        (LinkUnavailable, Mr) => "क्षमस्व, सध्या लिंक तयार करता आली नाही. कृपया पुन्हा प्रयत्न करा.",

        (OfficerAlert, En) => {
            "🚨 New {0} report in {1} division\n\
             From: {2}\n\
             Description: {3}\n\
             Address: {4}\n\
             Map: https://maps.google.com/?q={5},{6}\n\
             Photo: {7}"
        }
        (OfficerAlert, Mr) => {
            "🚨 {1} विभागात नवीन {0} तक्रार\n\
             तक्रारदार: {2}\n\
             वर्णन: {3}\n\
             पत्ता: {4}\n\
             नकाशा: https://maps.google.com/?q={5},{6}\n\
             फोटो: {7}"
        }
    }
}
